//! Scripted in-memory page.
//!
//! Backs integration tests and the CLI's rehearsal mode with a cooperative
//! implementation of [`PagePort`]: a mutable node tree plus reactions that
//! fire on click/fill/press/upload, so a test can script the streaming UI
//! ("after the prompt is submitted, the supplier grid appears").

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::errors::PageError;
use crate::port::{ElementRef, ElementState, PagePort};
use crate::query::{ElementQuery, TextMatch};

/// One node in the scripted DOM.
#[derive(Clone, Debug)]
pub struct MockNode {
    pub id: String,
    pub role: String,
    /// Accessible name.
    pub name: String,
    /// Visible text content.
    pub text: String,
    /// Selector tokens this node answers to for `ElementQuery::Css`.
    pub css: Vec<String>,
    pub visible: bool,
    pub enabled: bool,
    pub selected: bool,
    pub checked: bool,
    pub value: String,
    pub aria_text: String,
    pub bbox: Option<(f64, f64, f64, f64)>,
    pub children: Vec<MockNode>,
}

impl MockNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: String::new(),
            name: String::new(),
            text: String::new(),
            css: Vec::new(),
            visible: true,
            enabled: true,
            selected: false,
            checked: false,
            value: String::new(),
            aria_text: String::new(),
            bbox: None,
            children: Vec::new(),
        }
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn css(mut self, selector: impl Into<String>) -> Self {
        self.css.push(selector.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn aria_text(mut self, text: impl Into<String>) -> Self {
        self.aria_text = text.into();
        self
    }

    pub fn bbox(mut self, x: f64, y: f64, w: f64, h: f64) -> Self {
        self.bbox = Some((x, y, w, h));
        self
    }

    pub fn child(mut self, node: MockNode) -> Self {
        self.children.push(node);
        self
    }

    /// Convenience: the activity-counter element the heartbeat waiter polls.
    pub fn activity_counter(initial: u64) -> Self {
        MockNode::new("activity-counter")
            .role("status")
            .name("activity")
            .css("[data-activity-count]")
            .text(initial.to_string())
    }

    fn label(&self) -> String {
        let what = if !self.name.is_empty() {
            &self.name
        } else {
            &self.text
        };
        format!("{} '{}'", self.role, what)
    }
}

/// The mutable document, exposed to reactions and test setup.
pub struct MockDom {
    root: MockNode,
    url: String,
    title: String,
    clicks: Vec<String>,
    fills: Vec<(String, String)>,
    uploads: Vec<(String, Vec<PathBuf>)>,
    pointer_clicks: Vec<(f64, f64)>,
}

impl MockDom {
    fn new(root: MockNode) -> Self {
        Self {
            root,
            url: "https://mesh.example/app".to_string(),
            title: "Qube Mesh".to_string(),
            clicks: Vec::new(),
            fills: Vec::new(),
            uploads: Vec::new(),
            pointer_clicks: Vec::new(),
        }
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn find(&self, id: &str) -> Option<&MockNode> {
        fn walk<'a>(node: &'a MockNode, id: &str) -> Option<&'a MockNode> {
            if node.id == id {
                return Some(node);
            }
            node.children.iter().find_map(|c| walk(c, id))
        }
        walk(&self.root, id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut MockNode> {
        fn walk<'a>(node: &'a mut MockNode, id: &str) -> Option<&'a mut MockNode> {
            if node.id == id {
                return Some(node);
            }
            node.children.iter_mut().find_map(|c| walk(c, id))
        }
        walk(&mut self.root, id)
    }

    pub fn show(&mut self, id: &str) {
        if let Some(node) = self.find_mut(id) {
            node.visible = true;
        }
    }

    pub fn hide(&mut self, id: &str) {
        if let Some(node) = self.find_mut(id) {
            node.visible = false;
        }
    }

    pub fn set_text(&mut self, id: &str, text: impl Into<String>) {
        if let Some(node) = self.find_mut(id) {
            node.text = text.into();
        }
    }

    pub fn set_value(&mut self, id: &str, value: impl Into<String>) {
        if let Some(node) = self.find_mut(id) {
            node.value = value.into();
        }
    }

    pub fn set_aria_text(&mut self, id: &str, text: impl Into<String>) {
        if let Some(node) = self.find_mut(id) {
            node.aria_text = text.into();
        }
    }

    pub fn set_checked(&mut self, id: &str, checked: bool) {
        if let Some(node) = self.find_mut(id) {
            node.checked = checked;
        }
    }

    pub fn set_selected(&mut self, id: &str, selected: bool) {
        if let Some(node) = self.find_mut(id) {
            node.selected = selected;
        }
    }

    pub fn set_enabled(&mut self, id: &str, enabled: bool) {
        if let Some(node) = self.find_mut(id) {
            node.enabled = enabled;
        }
    }

    /// Flip an option's selected marker, like a real toggling listbox entry.
    pub fn toggle_selected(&mut self, id: &str) {
        if let Some(node) = self.find_mut(id) {
            node.selected = !node.selected;
        }
    }

    pub fn add_under(&mut self, parent_id: &str, node: MockNode) {
        if let Some(parent) = self.find_mut(parent_id) {
            parent.children.push(node);
        }
    }

    pub fn remove(&mut self, id: &str) {
        fn prune(node: &mut MockNode, id: &str) {
            node.children.retain(|c| c.id != id);
            for c in node.children.iter_mut() {
                prune(c, id);
            }
        }
        prune(&mut self.root, id);
    }

    /// Increment the activity counter, if the page carries one.
    pub fn bump_activity(&mut self) {
        fn walk(node: &mut MockNode) -> bool {
            if node.css.iter().any(|s| s == "[data-activity-count]") {
                let current: u64 = node.text.trim().parse().unwrap_or(0);
                node.text = (current + 1).to_string();
                return true;
            }
            node.children.iter_mut().any(walk)
        }
        walk(&mut self.root);
    }

    pub fn click_log(&self) -> &[String] {
        &self.clicks
    }

    pub fn fill_log(&self) -> &[(String, String)] {
        &self.fills
    }

    pub fn upload_log(&self) -> &[(String, Vec<PathBuf>)] {
        &self.uploads
    }

    pub fn pointer_click_log(&self) -> &[(f64, f64)] {
        &self.pointer_clicks
    }

    fn effective_visible(&self, id: &str) -> Option<bool> {
        fn walk(node: &MockNode, id: &str, ancestors_visible: bool) -> Option<bool> {
            let here = ancestors_visible && node.visible;
            if node.id == id {
                return Some(here);
            }
            node.children.iter().find_map(|c| walk(c, id, here))
        }
        walk(&self.root, id, true)
    }

    fn query_nodes(&self, query: &ElementQuery) -> Vec<&MockNode> {
        query_in(&self.root, query)
    }

    fn body_text(&self) -> String {
        fn walk(node: &MockNode, ancestors_visible: bool, out: &mut Vec<String>) {
            let here = ancestors_visible && node.visible;
            if here && !node.text.is_empty() {
                out.push(node.text.clone());
            }
            for c in &node.children {
                walk(c, here, out);
            }
        }
        let mut parts = Vec::new();
        walk(&self.root, true, &mut parts);
        parts.join(" ")
    }
}

fn node_matches(node: &MockNode, query: &ElementQuery) -> bool {
    match query {
        ElementQuery::Role { role, name } => {
            let accessible = if !node.name.is_empty() {
                node.name.as_str()
            } else {
                node.text.as_str()
            };
            node.role == *role && name.matches(accessible)
        }
        ElementQuery::Text(m) => {
            (!node.text.is_empty() && m.matches(&node.text))
                || (!node.name.is_empty() && m.matches(&node.name))
                || matches!(m, TextMatch::Any)
        }
        ElementQuery::Css(sel) => node.css.iter().any(|s| s == sel),
        // Composite queries are handled structurally in `query_in`.
        ElementQuery::Within { .. } | ElementQuery::Nth { .. } => false,
    }
}

fn query_in<'a>(scope: &'a MockNode, query: &ElementQuery) -> Vec<&'a MockNode> {
    match query {
        ElementQuery::Within { scope: s, inner } => {
            let mut out = Vec::new();
            for anchor in query_in(scope, s) {
                for child in &anchor.children {
                    out.extend(query_in_self(child, inner));
                }
            }
            out
        }
        ElementQuery::Nth { base, index } => query_in(scope, base)
            .into_iter()
            .nth(*index)
            .into_iter()
            .collect(),
        leaf => {
            let mut out = Vec::new();
            for child in &scope.children {
                out.extend(query_in_self(child, leaf));
            }
            out
        }
    }
}

/// Like `query_in` but includes `node` itself as a match candidate.
fn query_in_self<'a>(node: &'a MockNode, query: &ElementQuery) -> Vec<&'a MockNode> {
    match query {
        ElementQuery::Within { .. } | ElementQuery::Nth { .. } => query_in(node, query),
        leaf => {
            let mut out = Vec::new();
            if node_matches(node, leaf) {
                out.push(node);
            }
            for child in &node.children {
                out.extend(query_in_self(child, leaf));
            }
            out
        }
    }
}

type ClickReaction = Box<dyn FnMut(&mut MockDom) + Send>;
type TextReaction = Box<dyn FnMut(&mut MockDom, &str) + Send>;

struct MockState {
    dom: MockDom,
    on_click: HashMap<String, Vec<ClickReaction>>,
    on_fill: HashMap<String, Vec<TextReaction>>,
    on_press: HashMap<String, Vec<TextReaction>>,
    on_upload: HashMap<String, Vec<ClickReaction>>,
}

/// Scripted [`PagePort`] implementation.
pub struct MockPage {
    state: Mutex<MockState>,
}

impl MockPage {
    pub fn new(root: MockNode) -> Self {
        Self {
            state: Mutex::new(MockState {
                dom: MockDom::new(root),
                on_click: HashMap::new(),
                on_fill: HashMap::new(),
                on_press: HashMap::new(),
                on_upload: HashMap::new(),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// React to clicks on the node with `id`.
    pub fn on_click(&self, id: impl Into<String>, f: impl FnMut(&mut MockDom) + Send + 'static) {
        self.lock()
            .on_click
            .entry(id.into())
            .or_default()
            .push(Box::new(f));
    }

    /// React to `fill` on the node with `id`; receives the typed text.
    pub fn on_fill(
        &self,
        id: impl Into<String>,
        f: impl FnMut(&mut MockDom, &str) + Send + 'static,
    ) {
        self.lock()
            .on_fill
            .entry(id.into())
            .or_default()
            .push(Box::new(f));
    }

    /// React to key presses on the node with `id`; receives the key name.
    pub fn on_press(
        &self,
        id: impl Into<String>,
        f: impl FnMut(&mut MockDom, &str) + Send + 'static,
    ) {
        self.lock()
            .on_press
            .entry(id.into())
            .or_default()
            .push(Box::new(f));
    }

    /// React to file attachment through the node with `id`.
    pub fn on_upload(&self, id: impl Into<String>, f: impl FnMut(&mut MockDom) + Send + 'static) {
        self.lock()
            .on_upload
            .entry(id.into())
            .or_default()
            .push(Box::new(f));
    }

    /// Mutate the document directly (test setup and assertions).
    pub fn mutate<R>(&self, f: impl FnOnce(&mut MockDom) -> R) -> R {
        f(&mut self.lock().dom)
    }

    /// Inspect the document (test assertions).
    pub fn inspect<R>(&self, f: impl FnOnce(&MockDom) -> R) -> R {
        f(&self.lock().dom)
    }

    fn run_click_reactions(state: &mut MockState, id: &str) {
        if let Some(mut fns) = state.on_click.remove(id) {
            for f in fns.iter_mut() {
                f(&mut state.dom);
            }
            let slot = state.on_click.entry(id.to_string()).or_default();
            let registered_during_run = std::mem::take(slot);
            *slot = fns;
            slot.extend(registered_during_run);
        }
    }
}

#[async_trait]
impl PagePort for MockPage {
    async fn query(&self, query: &ElementQuery) -> Result<Vec<ElementRef>, PageError> {
        let state = self.lock();
        Ok(state
            .dom
            .query_nodes(query)
            .into_iter()
            .map(|n| ElementRef::new(n.id.clone(), n.label()))
            .collect())
    }

    async fn state(&self, element: &ElementRef) -> Result<ElementState, PageError> {
        let state = self.lock();
        let visible = state
            .dom
            .effective_visible(&element.id)
            .ok_or_else(|| PageError::Stale(element.label.clone()))?;
        let node = state
            .dom
            .find(&element.id)
            .ok_or_else(|| PageError::Stale(element.label.clone()))?;
        Ok(ElementState {
            visible,
            enabled: node.enabled,
            selected: node.selected,
            checked: node.checked,
            text: node.text.clone(),
            value: node.value.clone(),
            aria_text: node.aria_text.clone(),
            bbox: node.bbox,
        })
    }

    async fn click(&self, element: &ElementRef) -> Result<(), PageError> {
        let mut state = self.lock();
        let visible = state
            .dom
            .effective_visible(&element.id)
            .ok_or_else(|| PageError::Stale(element.label.clone()))?;
        let enabled = state
            .dom
            .find(&element.id)
            .map(|n| n.enabled)
            .unwrap_or(false);
        if !visible || !enabled {
            return Err(PageError::NotInteractable(element.label.clone()));
        }
        state.dom.clicks.push(element.id.clone());
        Self::run_click_reactions(&mut state, &element.id);
        Ok(())
    }

    async fn force_click(&self, element: &ElementRef) -> Result<(), PageError> {
        let mut state = self.lock();
        if state.dom.find(&element.id).is_none() {
            return Err(PageError::Stale(element.label.clone()));
        }
        state.dom.clicks.push(element.id.clone());
        Self::run_click_reactions(&mut state, &element.id);
        Ok(())
    }

    async fn pointer_click(&self, x: f64, y: f64) -> Result<(), PageError> {
        let mut state = self.lock();
        state.dom.pointer_clicks.push((x, y));
        fn hit<'a>(node: &'a MockNode, x: f64, y: f64, visible: bool) -> Option<&'a MockNode> {
            let here = visible && node.visible;
            let mut found = None;
            if here {
                if let Some((bx, by, bw, bh)) = node.bbox {
                    if x >= bx && x <= bx + bw && y >= by && y <= by + bh {
                        found = Some(node);
                    }
                }
            }
            for c in &node.children {
                if let Some(deeper) = hit(c, x, y, here) {
                    found = Some(deeper);
                }
            }
            found
        }
        let target = hit(&state.dom.root, x, y, true).map(|n| n.id.clone());
        if let Some(id) = target {
            state.dom.clicks.push(id.clone());
            Self::run_click_reactions(&mut state, &id);
        }
        Ok(())
    }

    async fn fill(&self, element: &ElementRef, text: &str) -> Result<(), PageError> {
        let mut state = self.lock();
        let node = state
            .dom
            .find_mut(&element.id)
            .ok_or_else(|| PageError::Stale(element.label.clone()))?;
        node.value = text.to_string();
        state.dom.fills.push((element.id.clone(), text.to_string()));
        if let Some(mut fns) = state.on_fill.remove(&element.id) {
            for f in fns.iter_mut() {
                f(&mut state.dom, text);
            }
            state.on_fill.insert(element.id.clone(), fns);
        }
        Ok(())
    }

    async fn press(&self, element: &ElementRef, key: &str) -> Result<(), PageError> {
        let mut state = self.lock();
        if state.dom.find(&element.id).is_none() {
            return Err(PageError::Stale(element.label.clone()));
        }
        if let Some(mut fns) = state.on_press.remove(&element.id) {
            for f in fns.iter_mut() {
                f(&mut state.dom, key);
            }
            state.on_press.insert(element.id.clone(), fns);
        }
        Ok(())
    }

    async fn scroll_into_view(&self, element: &ElementRef) -> Result<(), PageError> {
        let state = self.lock();
        if state.dom.find(&element.id).is_none() {
            return Err(PageError::Stale(element.label.clone()));
        }
        Ok(())
    }

    async fn set_input_files(
        &self,
        element: &ElementRef,
        paths: &[PathBuf],
    ) -> Result<(), PageError> {
        let mut state = self.lock();
        if state.dom.find(&element.id).is_none() {
            return Err(PageError::Stale(element.label.clone()));
        }
        state
            .dom
            .uploads
            .push((element.id.clone(), paths.to_vec()));
        if let Some(mut fns) = state.on_upload.remove(&element.id) {
            for f in fns.iter_mut() {
                f(&mut state.dom);
            }
            state.on_upload.insert(element.id.clone(), fns);
        }
        Ok(())
    }

    async fn url(&self) -> String {
        self.lock().dom.url.clone()
    }

    async fn title(&self) -> String {
        self.lock().dom.title.clone()
    }

    async fn body_text(&self) -> String {
        self.lock().dom.body_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_page() -> MockPage {
        MockPage::new(
            MockNode::new("root")
                .child(MockNode::activity_counter(3))
                .child(
                    MockNode::new("composer")
                        .role("group")
                        .child(
                            MockNode::new("prompt")
                                .role("textbox")
                                .name("Ask the agent"),
                        )
                        .child(MockNode::new("proceed").role("button").name("Proceed")),
                )
                .child(
                    MockNode::new("faq-dialog")
                        .role("dialog")
                        .name("FAQ")
                        .hidden()
                        .child(MockNode::new("faq-close").role("button").name("Close")),
                ),
        )
    }

    #[tokio::test]
    async fn role_query_finds_button() {
        let page = sample_page();
        let q = ElementQuery::role("button", TextMatch::Exact("Proceed".into()));
        let found = page.query(&q).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "proceed");
    }

    #[tokio::test]
    async fn within_scopes_to_subtree() {
        let page = sample_page();
        let q = ElementQuery::within(
            ElementQuery::role("dialog", TextMatch::Contains("faq".into())),
            ElementQuery::role("button", TextMatch::Exact("Close".into())),
        );
        let found = page.query(&q).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "faq-close");
    }

    #[tokio::test]
    async fn hidden_ancestor_masks_visibility() {
        let page = sample_page();
        let close = ElementRef::new("faq-close", "button 'Close'");
        let state = page.state(&close).await.unwrap();
        assert!(!state.visible);

        page.mutate(|dom| dom.show("faq-dialog"));
        let state = page.state(&close).await.unwrap();
        assert!(state.visible);
    }

    #[tokio::test]
    async fn click_reaction_fires_and_click_on_hidden_fails() {
        let page = sample_page();
        page.on_click("proceed", |dom| dom.bump_activity());

        let proceed = ElementRef::new("proceed", "button 'Proceed'");
        page.click(&proceed).await.unwrap();
        let counter = page.inspect(|dom| dom.find("activity-counter").unwrap().text.clone());
        assert_eq!(counter, "4");

        page.mutate(|dom| dom.hide("proceed"));
        let err = page.click(&proceed).await.unwrap_err();
        assert!(matches!(err, PageError::NotInteractable(_)));
        // Forced click bypasses the visibility check.
        page.force_click(&proceed).await.unwrap();
    }

    #[tokio::test]
    async fn pointer_click_hits_topmost_bbox() {
        let page = MockPage::new(
            MockNode::new("root")
                .child(MockNode::new("under").role("button").bbox(0.0, 0.0, 100.0, 100.0))
                .child(MockNode::new("over").role("button").bbox(40.0, 40.0, 20.0, 20.0)),
        );
        page.pointer_click(50.0, 50.0).await.unwrap();
        let clicks = page.inspect(|dom| dom.click_log().to_vec());
        assert_eq!(clicks, vec!["over".to_string()]);
    }

    #[tokio::test]
    async fn nth_query_picks_by_index() {
        let page = MockPage::new(
            MockNode::new("root")
                .child(MockNode::new("opt-a").role("option").name("Alpha"))
                .child(MockNode::new("opt-b").role("option").name("Beta")),
        );
        let q = ElementQuery::nth(ElementQuery::role("option", TextMatch::Any), 1);
        let found = page.query(&q).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "opt-b");
    }
}
