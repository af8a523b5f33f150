//! Browser-session capability used by the loader and extractor.
//!
//! The pipeline never talks to an automation driver directly. Anything that
//! can open a page, scroll it, list elements by selector and read element
//! attributes satisfies these traits; [`crate::webdriver`] is the production
//! implementation.

use std::future::Future;
use std::time::Duration;

use crate::error::SessionError;

/// One rendered element on a live page.
pub trait CardHandle: Send + Sync {
    /// Reads an attribute of the already-rendered element. `Ok(None)` when
    /// the attribute is absent. Must not mutate the page.
    fn attribute(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<String>, SessionError>> + Send;
}

/// A live page that reveals content as it is scrolled.
pub trait PageSession: Send + Sync {
    type Card: CardHandle;

    /// Scrolls the viewport down by `delta_px` pixels.
    fn scroll(&self, delta_px: i64) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Returns every element currently matching `selector`.
    fn query_all(
        &self,
        selector: &str,
    ) -> impl Future<Output = Result<Vec<Self::Card>, SessionError>> + Send;

    /// Ends the session and releases the browser.
    fn close(self) -> impl Future<Output = Result<(), SessionError>> + Send;
}

/// Opens page sessions already navigated to a URL.
pub trait SessionFactory: Send + Sync {
    type Session: PageSession;

    /// Opens a session and navigates to `url`. Navigation that does not
    /// finish within `timeout` is an error, and the half-open session is
    /// released before returning.
    fn open(
        &self,
        url: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<Self::Session, SessionError>> + Send;
}
