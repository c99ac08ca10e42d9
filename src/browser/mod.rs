//! Browser session management over the Chrome DevTools Protocol.

mod session;

pub use session::BrowserSession;
