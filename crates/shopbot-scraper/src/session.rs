//! The browser seam: everything the engine needs from a page, and nothing more.

use std::future::Future;
use std::time::Duration;

use shopbot_core::{Locator, SiteProfile};

use crate::error::SessionError;

/// WebDriver key code for Enter, sent through [`BrowsingSession::send_keys`].
pub const ENTER_KEY: &str = "\u{E007}";

/// One exclusively-owned browser session, driven sequentially.
pub trait BrowsingSession: Send {
    /// Handle to an element located on the current page.
    type Element: Send + Sync;

    fn open(&mut self, url: &str) -> impl Future<Output = Result<(), SessionError>> + Send;

    fn find_element(
        &mut self,
        locator: &Locator,
    ) -> impl Future<Output = Result<Self::Element, SessionError>> + Send;

    /// Polls for `locator` until it appears or `timeout` elapses.
    fn wait_for(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> impl Future<Output = Result<Self::Element, SessionError>> + Send;

    fn element_text(
        &mut self,
        element: &Self::Element,
    ) -> impl Future<Output = Result<String, SessionError>> + Send;

    fn click(
        &mut self,
        element: &Self::Element,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;

    fn send_keys(
        &mut self,
        element: &Self::Element,
        keys: &str,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;

    fn current_url(&mut self) -> impl Future<Output = Result<String, SessionError>> + Send;

    fn page_title(&mut self) -> impl Future<Output = Result<String, SessionError>> + Send;

    fn page_source(&mut self) -> impl Future<Output = Result<String, SessionError>> + Send;

    fn close(self) -> impl Future<Output = Result<(), SessionError>> + Send;
}

/// Opens one [`BrowsingSession`] per store run.
pub trait SessionFactory: Sync {
    type Session: BrowsingSession;

    fn open_session(
        &self,
        profile: &SiteProfile,
    ) -> impl Future<Output = Result<Self::Session, SessionError>> + Send;
}
