//! Headless view of one item.
//!
//! An [`ItemBinding`] keeps the data, domains and UI descriptor of one item
//! in step with a core, reacting to `Connect`, `Change` and `Reload` on the
//! channel it listens to. Every refresh bumps [`ItemBinding::version`];
//! derived values such as decorators and hints are recomputed on each read.

use crate::bus::{BusEvent, ChangeNotice, EventKind, ReloadTarget};
use crate::channel::{ListenerId, SimputChannel};
use crate::error::SyncResult;
use crate::field;
use crate::manager::DataManager;
use simput_types::{Decorator, DomainMap, Hint, Item, ItemId, Properties, UiDescriptor};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::debug;

#[derive(Debug, Clone, Default)]
struct ItemView {
    id: Option<ItemId>,
    data: Option<Item>,
    domains: Option<DomainMap>,
    ui: Option<UiDescriptor>,
    version: u64,
}

impl ItemView {
    fn type_name(&self) -> Option<String> {
        self.data.as_ref().and_then(|item| item.type_name.clone())
    }
}

struct BindingInner {
    manager: Arc<DataManager>,
    channel: Arc<SimputChannel>,
    view: Mutex<ItemView>,
}

impl BindingInner {
    fn view(&self) -> MutexGuard<'_, ItemView> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self) {
        let id = self.view().id.clone();
        let Some(id) = id else {
            let mut view = self.view();
            view.data = None;
            view.ui = None;
            view.version += 1;
            return;
        };

        let data = self.manager.get_data(&id, false);
        let domains = self.manager.get_domains(&id, false);
        let ui = data
            .as_ref()
            .and_then(|item| item.type_name.as_deref())
            .and_then(|type_name| self.manager.get_ui(type_name, false));
        {
            let mut view = self.view();
            view.data = data;
            view.domains = domains;
            view.ui = ui;
            view.version += 1;
        }
        self.channel.push_query();
    }

    fn on_change(&self, notice: &ChangeNotice) {
        let (id, type_name, has_ui) = {
            let view = self.view();
            (view.id.clone(), view.type_name(), view.ui.is_some())
        };

        let mut data = None;
        if let (Some(changed), Some(id)) = (&notice.id, &id) {
            if changed == id {
                debug!("Item {} changed", id);
                data = Some((
                    self.manager.get_data(id, false),
                    self.manager.get_domains(id, false),
                ));
            }
        }

        let wants_ui = match (&notice.type_name, &type_name) {
            (Some(changed), Some(current)) => changed == current,
            (None, Some(_)) => !has_ui,
            _ => false,
        };
        let ui = match (&type_name, wants_ui) {
            (Some(type_name), true) => Some(self.manager.get_ui(type_name, false)),
            _ => None,
        };

        if data.is_none() && ui.is_none() {
            return;
        }
        let mut view = self.view();
        if let Some((item, domains)) = data {
            view.data = item;
            view.domains = domains;
        }
        if let Some(ui) = ui {
            view.ui = ui;
        }
        view.version += 1;
    }

    fn on_reload(&self, target: ReloadTarget) {
        let (id, type_name) = {
            let view = self.view();
            (view.id.clone(), view.type_name())
        };
        debug!("Reloading {} for {:?}", target, id);
        match target {
            ReloadTarget::Data => {
                if let Some(id) = &id {
                    let item = self.manager.get_data(id, true);
                    let mut view = self.view();
                    view.data = item;
                    view.version += 1;
                }
            }
            ReloadTarget::Ui => {
                if let Some(type_name) = &type_name {
                    let ui = self.manager.get_ui(type_name, true);
                    let mut view = self.view();
                    view.ui = ui;
                    view.version += 1;
                }
            }
            ReloadTarget::Domain => {
                self.manager.reset_domains();
                if let Some(id) = &id {
                    let domains = self.manager.get_domains(id, true);
                    let mut view = self.view();
                    view.domains = domains;
                    view.version += 1;
                }
            }
        }
    }
}

/// Keeps one item's state in step with a core.
///
/// Listeners are removed from the channel when the binding is dropped.
pub struct ItemBinding {
    inner: Arc<BindingInner>,
    listeners: Vec<ListenerId>,
}

impl ItemBinding {
    /// Binds `id` (or nothing yet) and pulls its current state.
    pub fn new(
        manager: Arc<DataManager>,
        channel: Arc<SimputChannel>,
        id: Option<ItemId>,
    ) -> Self {
        let inner = Arc::new(BindingInner {
            manager,
            channel: Arc::clone(&channel),
            view: Mutex::new(ItemView {
                id,
                ..ItemView::default()
            }),
        });

        let weak = Arc::downgrade(&inner);
        let listeners = vec![
            channel.on(EventKind::Connect, with_inner(weak.clone(), |inner, _| inner.update())),
            channel.on(
                EventKind::Change,
                with_inner(weak.clone(), |inner, event| {
                    if let BusEvent::Change(notice) = event {
                        inner.on_change(notice);
                    }
                }),
            ),
            channel.on(
                EventKind::Reload,
                with_inner(weak.clone(), |inner, event| {
                    if let BusEvent::Reload(target) = event {
                        inner.on_reload(*target);
                    }
                }),
            ),
        ];

        inner.update();
        Self { inner, listeners }
    }

    /// Switches to another item, clearing the current view first.
    pub fn set_item(&self, id: Option<ItemId>) {
        {
            let mut view = self.inner.view();
            view.id = id;
            view.data = None;
            view.ui = None;
        }
        self.inner.update();
    }

    /// Pulls data, domains and UI again without forcing a fetch.
    pub fn refresh(&self) {
        self.inner.update();
    }

    pub fn id(&self) -> Option<ItemId> {
        self.inner.view().id.clone()
    }

    pub fn data(&self) -> Option<Item> {
        self.inner.view().data.clone()
    }

    pub fn domains(&self) -> Option<DomainMap> {
        self.inner.view().domains.clone()
    }

    pub fn ui(&self) -> Option<UiDescriptor> {
        self.inner.view().ui.clone()
    }

    pub fn properties(&self) -> Option<Properties> {
        self.inner
            .view()
            .data
            .as_ref()
            .map(|item| item.properties.clone())
    }

    /// Type of the bound item, once its data is known.
    pub fn type_name(&self) -> Option<String> {
        self.inner.view().type_name()
    }

    /// Bumped every time the view is refreshed.
    pub fn version(&self) -> u64 {
        self.inner.view().version
    }

    /// The core's UI timestamp.
    pub fn ui_timestamp(&self) -> u64 {
        self.inner.manager.ui_timestamp()
    }

    /// Whether data, domains and UI are all present.
    pub fn available(&self) -> bool {
        let view = self.inner.view();
        view.data.is_some() && view.domains.is_some() && view.ui.is_some()
    }

    /// Decorator of `name` under the current domains.
    pub fn decorator(&self, name: &str) -> Decorator {
        self.inner
            .view()
            .domains
            .as_ref()
            .map(|domains| domains.decorator(name))
            .unwrap_or_default()
    }

    /// Hints of `name` under the current domains.
    pub fn hints(&self, name: &str) -> Vec<Hint> {
        self.inner
            .view()
            .domains
            .as_ref()
            .map(|domains| domains.hints(name))
            .unwrap_or_default()
    }

    /// Whether the field `name` should be shown under the channel's query.
    pub fn field_visible(&self, name: &str, label: &str) -> bool {
        let query = self.inner.channel.query().to_lowercase();
        field::should_show(&query, name, label, &self.decorator(name))
    }

    /// Reports a local edit of `name`. A no-op until data has arrived.
    pub async fn dirty(&self, name: &str) -> SyncResult<()> {
        match self.data_id() {
            Some(id) => self.inner.channel.mark_dirty(&id, name).await,
            None => Ok(()),
        }
    }

    /// Reports local edits of several properties.
    pub async fn dirty_many<S: AsRef<str> + Sync>(&self, names: &[S]) -> SyncResult<()> {
        match self.data_id() {
            Some(id) => self.inner.channel.mark_dirty_many(&id, names).await,
            None => Ok(()),
        }
    }

    fn data_id(&self) -> Option<ItemId> {
        self.inner.view().data.as_ref().map(|item| item.id.clone())
    }
}

impl Drop for ItemBinding {
    fn drop(&mut self) {
        for id in self.listeners.drain(..) {
            self.inner.channel.off(id);
        }
    }
}

fn with_inner<F>(weak: Weak<BindingInner>, f: F) -> impl Fn(&BusEvent) + Send + Sync + 'static
where
    F: Fn(&BindingInner, &BusEvent) + Send + Sync + 'static,
{
    move |event| {
        if let Some(inner) = weak.upgrade() {
            f(&inner, event);
        }
    }
}
