//! In-memory [`World`] and [`Browser`] shared by the integration tests.

#![allow(dead_code)]

use std::{convert::Infallible, time::Duration};

use async_trait::async_trait;
use futures::{
    future::{self, LocalBoxFuture},
    FutureExt as _,
};
use stepwright::{
    heal::{DriverError, ElementSnapshot, Fingerprint, Presence},
    Browser, Context, Definition, HandlerError, Keyword, Locator, ModuleRequirement,
    Registry, World,
};

pub const FEATURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/features");

/// Element rendered on a [`Page`].
#[derive(Clone, Debug)]
pub struct Element {
    pub locator: Locator,
    pub presence: Presence,
    pub fingerprint: Fingerprint,
}

impl Element {
    pub fn new(locator: Locator, presence: Presence, fingerprint: Fingerprint) -> Self {
        Self { locator, presence, fingerprint }
    }
}

/// Page of a fake browser.
#[derive(Clone, Debug, Default)]
pub struct Page {
    pub elements: Vec<Element>,
    pub overlays: usize,
    /// Banner covering everything which cannot be removed.
    pub pinned: bool,
    pub modals: usize,
    pub clicks: Vec<String>,
}

impl Page {
    /// Builds one of the known pages.
    pub fn named(name: &str) -> Self {
        match name {
            // Checkout button rendered below the fold.
            "shop" => Self {
                elements: vec![Element::new(
                    Locator::css("#checkout"),
                    Presence::OutOfView,
                    known("checkout"),
                )],
                ..Self::default()
            },
            // Buy button covered by a banner.
            "promo" => Self {
                elements: vec![Element::new(
                    Locator::css("#buy"),
                    Presence::Actionable,
                    known("buy"),
                )],
                overlays: 1,
                ..Self::default()
            },
            // Buy button covered by a banner and a dialog.
            "crowded" => Self {
                elements: vec![Element::new(
                    Locator::css("#buy"),
                    Presence::Actionable,
                    known("buy"),
                )],
                overlays: 1,
                modals: 1,
                ..Self::default()
            },
            // Buy button under a banner nothing removes.
            "pinned" => Self {
                elements: vec![Element::new(
                    Locator::css("#buy"),
                    Presence::Actionable,
                    known("buy"),
                )],
                pinned: true,
                ..Self::default()
            },
            // Buy button renamed, along with a look-alike link.
            "redesigned" => Self {
                elements: vec![
                    Element::new(
                        Locator::css("#later"),
                        Presence::Actionable,
                        Fingerprint::tag("a").with_text("Buy later"),
                    ),
                    Element::new(
                        Locator::css("#purchase"),
                        Presence::Actionable,
                        known("buy").with_id("purchase"),
                    ),
                ],
                ..Self::default()
            },
            _ => Self::default(),
        }
    }

    fn find(&self, locator: &Locator) -> Option<&Element> {
        self.elements.iter().find(|e| e.locator.addresses_same(locator))
    }

    fn find_mut(&mut self, locator: &Locator) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.locator.addresses_same(locator))
    }

    fn presence(&self, locator: &Locator) -> Presence {
        match self.find(locator) {
            None => Presence::Missing,
            Some(_) if self.modals > 0 => Presence::Obscured,
            Some(e)
                if e.presence == Presence::Actionable && (self.overlays > 0 || self.pinned) =>
            {
                Presence::Obscured
            }
            Some(e) => e.presence,
        }
    }

    /// Clicks the element, if it's actionable or the click is forced onto a
    /// present one.
    pub fn click(&mut self, locator: &Locator) -> bool {
        let ok = match self.presence(locator) {
            Presence::Actionable => true,
            Presence::Missing => false,
            _ => locator.force,
        };
        if ok {
            let forced = if locator.force { "forced " } else { "" };
            self.clicks.push(format!("{forced}{locator}"));
        }
        ok
    }
}

#[async_trait(?Send)]
impl Browser for Page {
    async fn probe(&mut self, locator: &Locator) -> Result<Presence, DriverError> {
        Ok(self.presence(locator))
    }

    async fn scroll_into_view(&mut self, locator: &Locator) -> Result<bool, DriverError> {
        Ok(match self.find_mut(locator) {
            Some(e) if e.presence == Presence::OutOfView => {
                e.presence = Presence::Actionable;
                true
            }
            _ => false,
        })
    }

    async fn wait_for_visible(
        &mut self,
        locator: &Locator,
        _: Duration,
    ) -> Result<bool, DriverError> {
        Ok(match self.find_mut(locator) {
            Some(e) if e.presence == Presence::Hidden => {
                e.presence = Presence::Actionable;
                true
            }
            _ => false,
        })
    }

    async fn remove_overlays(&mut self, _: &Locator) -> Result<usize, DriverError> {
        Ok(std::mem::take(&mut self.overlays))
    }

    async fn dismiss_modals(&mut self) -> Result<usize, DriverError> {
        Ok(std::mem::take(&mut self.modals))
    }

    async fn candidates(&mut self) -> Result<Vec<ElementSnapshot>, DriverError> {
        Ok(self
            .elements
            .iter()
            .map(|e| ElementSnapshot {
                locator: e.locator.clone(),
                fingerprint: e.fingerprint.clone(),
            })
            .collect())
    }
}

/// Last known look of the named button.
pub fn known(button: &str) -> Fingerprint {
    match button {
        "buy" => Fingerprint::tag("button")
            .with_text("Buy now")
            .with_attr("data-action", "buy"),
        other => Fingerprint::tag("button").with_text(other),
    }
}

/// Application under test.
#[derive(Debug, Default)]
pub struct App {
    pub modules: ModuleRequirement,
    pub page: Option<Page>,
}

impl World for App {
    type Error = Infallible;

    async fn new(modules: &ModuleRequirement) -> Result<Self, Infallible> {
        Ok(Self {
            modules: *modules,
            page: modules.ui.then(Page::default),
        })
    }

    fn browser(&mut self) -> Option<&mut dyn Browser> {
        self.page.as_mut().map(|p| p as &mut dyn Browser)
    }
}

fn open(w: &mut App, ctx: Context) -> LocalBoxFuture<'_, Result<(), HandlerError>> {
    async move {
        let name = ctx.str(0).ok_or("no page name")?;
        let page = w.page.as_mut().ok_or("browser not started")?;
        *page = Page::named(name);
        Ok(())
    }
    .boxed_local()
}

fn click(w: &mut App, ctx: Context) -> LocalBoxFuture<'_, Result<(), HandlerError>> {
    async move {
        let name = ctx.str(0).ok_or("no button name")?;
        let target = ctx.target(Locator::css(format!("#{name}")).with_fingerprint(known(name)));
        let page = w.page.as_mut().ok_or("browser not started")?;
        if page.click(&target) {
            Ok(())
        } else {
            Err(HandlerError::element_not_found(target))
        }
    }
    .boxed_local()
}

fn stored(w: &mut App, _: Context) -> LocalBoxFuture<'_, Result<(), HandlerError>> {
    async move {
        if w.modules.database {
            Ok(())
        } else {
            Err("database not connected".into())
        }
    }
    .boxed_local()
}

fn request(w: &mut App, ctx: Context) -> LocalBoxFuture<'_, Result<(), HandlerError>> {
    async move {
        let path = ctx.str(0).ok_or("no path")?;
        if !path.starts_with('/') {
            return Err(format!("`{path}` is not absolute").into());
        }
        if w.modules.api {
            Ok(())
        } else {
            Err("api client not started".into())
        }
    }
    .boxed_local()
}

fn stall(_: &mut App, _: Context) -> LocalBoxFuture<'_, Result<(), HandlerError>> {
    future::pending().boxed_local()
}

/// Every step the fixtures use.
pub fn steps() -> Registry<App> {
    let mut reg = Registry::new();
    reg.given("I open the {word} page", open)
        .unwrap()
        .when("I click the {word} button", click)
        .unwrap()
        .then("the order is stored in the database", stored)
        .unwrap()
        .when("I send a GET request to {string}", request)
        .unwrap();
    reg.register(
        Definition::new(Keyword::When, "the page takes forever to load", stall)
            .unwrap()
            .with_timeout(Duration::from_millis(100)),
    )
    .unwrap();
    reg
}
