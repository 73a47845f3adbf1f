//! Data models for ShelfMaster

pub mod book;
pub mod enums;
pub mod stats;
pub mod transaction;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookCopy, Category, CopyDetails};
pub use enums::{BookCopyStatus, RequestStatus, RequestType, TransactionStatus, UserRole};
pub use stats::DashboardStats;
pub use transaction::{Request, ReturnRecord, Transaction, TransactionDetails};
pub use user::{Clerk, ClerkDetails, StaffAccount, User, UserClaims, UserShort};
