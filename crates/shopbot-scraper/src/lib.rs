//! Browser-driven product search across grocery store websites.
//!
//! [`run_all`] fans a shopping list out over every requested store, each on
//! its own [`BrowsingSession`]; [`search_item`] handles one item on one page;
//! [`extract`] turns raw page text into typed fields.

pub mod error;
pub mod extract;
pub mod observe;
pub mod run;
pub mod search;
pub mod session;
pub mod webdriver;

pub use error::SessionError;
pub use extract::{extract_name, extract_price, rewrite_url};
pub use observe::{RunEvent, RunObserver, TracingObserver};
pub use run::{run_all, RunSettings};
pub use search::{search_item, SearchSettings};
pub use session::{BrowsingSession, SessionFactory, ENTER_KEY};
pub use webdriver::{WebDriverSession, WebDriverSessionFactory};
