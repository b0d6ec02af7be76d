//! Page-switch notification.
//!
//! Every content swap is followed by one pass over the registered hooks, in
//! registration order. Hooks re-scan the fresh content (tooltips, math) and
//! may wait for their own prerequisites; see [`crate::ready`].

use crate::page::Page;
use anyhow::Result;
use std::future::Future;
use std::pin::Pin;

pub type HookFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + 'a>>;

pub trait PageSwitchHook {
    fn name(&self) -> &str;
    fn on_page_switch<'a>(&'a mut self, title: &'a str, page: &'a mut Page) -> HookFuture<'a>;
}

/// A synchronous hook built from a closure.
pub struct FnHook<F> {
    name: String,
    f: F,
}

pub fn from_fn<F>(name: &str, f: F) -> FnHook<F>
where
    F: FnMut(&str, &mut Page) -> Result<()>,
{
    FnHook {
        name: name.to_string(),
        f,
    }
}

impl<F> PageSwitchHook for FnHook<F>
where
    F: FnMut(&str, &mut Page) -> Result<()>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn on_page_switch<'a>(&'a mut self, title: &'a str, page: &'a mut Page) -> HookFuture<'a> {
        let result = (self.f)(title, page);
        Box::pin(async move { result })
    }
}

/// Ordered hook list. There is no unregister.
#[derive(Default)]
pub struct PageSwitchHooks {
    hooks: Vec<Box<dyn PageSwitchHook>>,
}

impl PageSwitchHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, hook: impl PageSwitchHook + 'static) {
        tracing::debug!(hook = hook.name(), "registered page-switch hook");
        self.hooks.push(Box::new(hook));
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run every hook once. A failing hook does not stop the others; the
    /// first error is returned once all have run.
    pub async fn notify(&mut self, title: &str, page: &mut Page) -> Result<()> {
        let mut first_error = None;
        for hook in &mut self.hooks {
            tracing::info!(hook = hook.name(), page = title, "page switch");
            if let Err(e) = hook.on_page_switch(title, page).await {
                let e = e.context(format!("page-switch hook `{}` failed", hook.name()));
                tracing::warn!("{:#}", e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use crate::layout::FixedLayout;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn page() -> Page {
        let doc = Document::new();
        let body = doc.body();
        Page::new(doc, Box::new(FixedLayout::new()), body, body, 24.0)
    }

    #[tokio::test]
    async fn hooks_run_in_registration_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut hooks = PageSwitchHooks::new();
        for name in ["first", "second", "third"] {
            let seen = Rc::clone(&seen);
            hooks.register(from_fn(name, move |title, _| {
                seen.borrow_mut().push(format!("{}:{}", name, title));
                Ok(())
            }));
        }
        hooks.notify("Intro", &mut page()).await.unwrap();
        assert_eq!(
            *seen.borrow(),
            ["first:Intro", "second:Intro", "third:Intro"]
        );
    }

    #[tokio::test]
    async fn failing_hook_does_not_stop_later_ones() {
        let ran = Rc::new(RefCell::new(0));
        let mut hooks = PageSwitchHooks::new();
        hooks.register(from_fn("broken", |_, _| anyhow::bail!("no typesetter")));
        let counter = Rc::clone(&ran);
        hooks.register(from_fn("counter", move |_, _| {
            *counter.borrow_mut() += 1;
            Ok(())
        }));

        let err = hooks.notify("Intro", &mut page()).await.unwrap_err();
        assert_eq!(*ran.borrow(), 1);
        let msg = format!("{:#}", err);
        assert!(msg.contains("`broken`"), "{}", msg);
        assert!(msg.contains("no typesetter"), "{}", msg);
    }

    #[tokio::test]
    async fn hooks_see_the_page() {
        let mut hooks = PageSwitchHooks::new();
        hooks.register(from_fn("marker", |title, page| {
            let main = page.main;
            page.doc.set_attr(main, "data-page", title);
            Ok(())
        }));
        let mut page = page();
        hooks.notify("Boxes", &mut page).await.unwrap();
        assert_eq!(page.doc.attr(page.main, "data-page"), Some("Boxes"));
    }
}
