use std::collections::HashMap;
use std::fmt;

use tracing::info;

use crate::post::{Post, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Update,
    Delete,
}

impl ActionKind {
    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::Update => "[ update ]",
            ActionKind::Delete => "[ delete ]",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Update => f.write_str("update"),
            ActionKind::Delete => f.write_str("delete"),
        }
    }
}

pub enum Header {
    Static(&'static str),
    Computed(fn() -> String),
}

pub enum ColumnKind {
    Data {
        accessor: fn(&Post) -> Value,
        cell: Option<fn(&Value) -> String>,
    },
    // No backing value, never sortable
    Action(ActionKind),
}

pub struct ColumnDef {
    pub key: &'static str,
    pub header: Header,
    pub kind: ColumnKind,
    pub min_width: u16,
    // Takes a share of the remaining width
    pub grow: bool,
}

impl ColumnDef {
    pub fn header_text(&self) -> String {
        match &self.header {
            Header::Static(s) => s.to_string(),
            Header::Computed(f) => f(),
        }
    }

    pub fn is_sortable(&self) -> bool {
        matches!(self.kind, ColumnKind::Data { .. })
    }

    pub fn action(&self) -> Option<ActionKind> {
        match self.kind {
            ColumnKind::Action(kind) => Some(kind),
            ColumnKind::Data { .. } => None,
        }
    }

    pub fn value(&self, post: &Post) -> Option<Value> {
        match &self.kind {
            ColumnKind::Data { accessor, .. } => Some(accessor(post)),
            ColumnKind::Action(_) => None,
        }
    }

    /// Display text of this column for one row. Falls back to the raw accessed
    /// value when no cell renderer is set.
    pub fn render(&self, post: &Post) -> String {
        match &self.kind {
            ColumnKind::Data { accessor, cell } => {
                let value = accessor(post);
                match cell {
                    Some(f) => f(&value),
                    None => value.to_string(),
                }
            }
            ColumnKind::Action(kind) => kind.label().to_string(),
        }
    }
}

fn title_header() -> String {
    "Title".to_string()
}

fn upper_case(value: &Value) -> String {
    value.to_string().to_uppercase()
}

pub fn post_columns() -> Vec<ColumnDef> {
    vec![
        ColumnDef {
            key: "userId",
            header: Header::Static("User ID"),
            kind: ColumnKind::Data {
                accessor: |p| Value::Int(p.user_id),
                cell: None,
            },
            min_width: 7,
            grow: false,
        },
        ColumnDef {
            key: "id",
            header: Header::Static("ID"),
            kind: ColumnKind::Data {
                accessor: |p| Value::Int(p.id),
                cell: None,
            },
            min_width: 5,
            grow: false,
        },
        ColumnDef {
            key: "title",
            header: Header::Computed(title_header),
            kind: ColumnKind::Data {
                accessor: |p| Value::Text(p.title.clone()),
                cell: Some(upper_case),
            },
            min_width: 20,
            grow: true,
        },
        ColumnDef {
            key: "body",
            header: Header::Static("Body"),
            kind: ColumnKind::Data {
                accessor: |p| Value::Text(format!("[Body] {}", p.body)),
                cell: None,
            },
            min_width: 20,
            grow: true,
        },
        ColumnDef {
            key: "update",
            header: Header::Static(""),
            kind: ColumnKind::Action(ActionKind::Update),
            min_width: 10,
            grow: false,
        },
        ColumnDef {
            key: "delete",
            header: Header::Static(""),
            kind: ColumnKind::Action(ActionKind::Delete),
            min_width: 10,
            grow: false,
        },
    ]
}

type ActionHandler = Box<dyn Fn(i64)>;

/// Maps every action kind to one handler taking the row's record id.
pub struct ActionDispatch {
    handlers: HashMap<ActionKind, ActionHandler>,
}

impl ActionDispatch {
    pub fn on(&mut self, kind: ActionKind, handler: impl Fn(i64) + 'static) {
        self.handlers.insert(kind, Box::new(handler));
    }

    pub fn dispatch(&self, kind: ActionKind, id: i64) {
        match self.handlers.get(&kind) {
            Some(handler) => handler(id),
            None => info!("No handler for {kind}, ignoring id {id}"),
        }
    }
}

impl Default for ActionDispatch {
    fn default() -> Self {
        let mut dispatch = Self {
            handlers: HashMap::new(),
        };
        dispatch.on(ActionKind::Update, |id| info!("update: {id}"));
        dispatch.on(ActionKind::Delete, |id| info!("delete: {id}"));
        dispatch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::rc::Rc;

    fn post() -> Post {
        Post {
            user_id: 1,
            id: 7,
            title: "sunt aut facere".into(),
            body: "quia et suscipit".into(),
        }
    }

    #[test]
    fn schema_has_six_unique_keys() {
        let columns = post_columns();
        let keys: HashSet<_> = columns.iter().map(|c| c.key).collect();
        assert_eq!(columns.len(), 6);
        assert_eq!(keys.len(), 6);
    }

    #[test]
    fn renders_each_column() {
        let p = post();
        let rendered: Vec<String> = post_columns().iter().map(|c| c.render(&p)).collect();
        assert_eq!(
            rendered,
            vec![
                "1",
                "7",
                "SUNT AUT FACERE",
                "[Body] quia et suscipit",
                "[ update ]",
                "[ delete ]"
            ]
        );
        // renderers never touch the record
        assert_eq!(p.title, "sunt aut facere");
    }

    #[test]
    fn title_sorts_by_accessed_value_not_rendered_text() {
        let columns = post_columns();
        let title = &columns[2];
        assert_eq!(title.header_text(), "Title");
        assert_eq!(title.value(&post()), Some(Value::Text("sunt aut facere".into())));
    }

    #[test]
    fn action_columns_are_not_sortable() {
        let columns = post_columns();
        let sortable: Vec<_> = columns
            .iter()
            .filter(|c| c.is_sortable())
            .map(|c| c.key)
            .collect();
        assert_eq!(sortable, vec!["userId", "id", "title", "body"]);
        assert_eq!(columns[4].action(), Some(ActionKind::Update));
        assert_eq!(columns[5].action(), Some(ActionKind::Delete));
        assert_eq!(columns[4].value(&post()), None);
    }

    #[test]
    fn dispatch_passes_row_id_to_matching_handler() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut dispatch = ActionDispatch::default();
        let c = Rc::clone(&calls);
        dispatch.on(ActionKind::Update, move |id| c.borrow_mut().push(("update", id)));
        let c = Rc::clone(&calls);
        dispatch.on(ActionKind::Delete, move |id| c.borrow_mut().push(("delete", id)));

        dispatch.dispatch(ActionKind::Update, 7);
        dispatch.dispatch(ActionKind::Delete, 3);

        assert_eq!(*calls.borrow(), vec![("update", 7), ("delete", 3)]);
    }
}
