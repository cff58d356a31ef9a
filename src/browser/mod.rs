//! Automated-browser session management: the CDP session backend, the
//! leased session pool, and the page wrapper drivers operate against.

pub mod page;
pub mod pool;
pub mod session;

pub use page::PageHandle;
pub use pool::{PoolStats, SessionId, SessionLease, SessionPool};
pub use session::{BrowserSession, CdpBackend, SessionBackend};
