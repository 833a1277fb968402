use arboard::Clipboard;
use ratatui::crossterm::event::KeyEvent;
use std::sync::Arc;
use tracing::{debug, error, info, trace};

use crate::columns::{ActionDispatch, ActionKind, post_columns};
use crate::domain::{CMDMode, HELP_TEXT, Message, PAGE_SIZES, TVConfig, TVError};
use crate::inputter::{InputResult, Inputter};
use crate::post::Post;
use crate::source::{Fetch, PostSource};
use crate::table::{SortDirection, TableEngine};

#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    LOADING,
    READY,
    FAILED,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    TABLE,
    POPUP,
    CMDINPUT,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderView {
    pub name: String,
    pub min_width: u16,
    pub grow: bool,
    pub sort: Option<SortDirection>,
}

/// Everything the ui needs to draw one frame.
pub struct UIData {
    pub name: String,
    pub source: String,
    pub status: Status,
    pub error: Option<String>,
    pub headers: Vec<HeaderView>,
    pub rows: Vec<Vec<String>>,
    pub page_index: usize,
    pub page_count: usize,
    pub total_rows: usize,
    pub can_previous: bool,
    pub can_next: bool,
    pub page_size: usize,
    pub selected_row: usize,
    pub selected_column: usize,
    pub show_popup: bool,
    pub popup_message: String,
    pub cmdinput: InputResult,
    pub cmd_mode: Option<CMDMode>,
    pub active_cmdinput: bool,
    pub status_message: String,
}

impl UIData {
    pub fn empty() -> Self {
        UIData {
            name: String::new(),
            source: String::new(),
            status: Status::LOADING,
            error: None,
            headers: Vec::new(),
            rows: Vec::new(),
            page_index: 0,
            page_count: 1,
            total_rows: 0,
            can_previous: false,
            can_next: false,
            page_size: 0,
            selected_row: 0,
            selected_column: 0,
            show_popup: false,
            popup_message: String::new(),
            cmdinput: InputResult::default(),
            cmd_mode: None,
            active_cmdinput: false,
            status_message: String::new(),
        }
    }
}

pub struct Model {
    config: TVConfig,
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    source: Arc<dyn PostSource>,
    fetch: Option<Fetch>,
    engine: TableEngine,
    actions: ActionDispatch,
    page_size: usize, // Value shown by the page size selector
    curser_row: usize,
    curser_column: usize,
    load_error: Option<String>,
    uidata: UIData,
    clipboard: Option<Clipboard>,
    input: Inputter,
    cmd_mode: Option<CMDMode>,
    last_input: InputResult,
    active_cmdinput: bool,
    status_message: String,
}

impl Model {
    /// Creates the view and starts the initial fetch.
    pub fn init(config: &TVConfig, source: Arc<dyn PostSource>) -> Result<Self, TVError> {
        let engine = TableEngine::new(post_columns(), config.page_size)?;
        let mut model = Self {
            config: config.clone(),
            status: Status::LOADING,
            modus: Modus::TABLE,
            previous_modus: Modus::TABLE,
            source,
            fetch: None,
            engine,
            actions: ActionDispatch::default(),
            page_size: config.page_size,
            curser_row: 0,
            curser_column: 0,
            load_error: None,
            uidata: UIData::empty(),
            clipboard: None,
            input: Inputter::default(),
            cmd_mode: None,
            last_input: InputResult::default(),
            active_cmdinput: false,
            status_message: "Started ptv!".to_string(),
        };
        model.reload();
        model.update_uidata();
        Ok(model)
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    pub fn actions_mut(&mut self) -> &mut ActionDispatch {
        &mut self.actions
    }

    pub fn raw_keyevents(&self) -> bool {
        self.active_cmdinput
    }

    pub fn quit(&mut self) {
        if let Some(fetch) = self.fetch.take() {
            fetch.cancel();
        }
        self.status = Status::QUITTING;
    }

    pub fn update(&mut self, message: Option<Message>) -> Result<(), TVError> {
        self.sync_fetch();

        if let Some(msg) = message {
            match self.modus {
                Modus::TABLE => match msg {
                    Message::Quit => self.quit(),
                    Message::PreviousPage => self.engine.previous_page(),
                    Message::NextPage => self.engine.next_page(),
                    Message::FirstPage => self.engine.set_page_index(0),
                    Message::LastPage => {
                        let last = self.engine.page_count() - 1;
                        self.engine.set_page_index(last);
                    }
                    Message::EnterPageJump => self.enter_cmd_mode(CMDMode::PageJump),
                    Message::NextPageSize => self.step_page_size(1)?,
                    Message::PreviousPageSize => self.step_page_size(-1)?,
                    Message::NextColumn => self.move_column_selection(1),
                    Message::PreviousColumn => self.move_column_selection(-1),
                    Message::ToggleSort => self.toggle_sort_current_column(),
                    Message::MoveUp => self.curser_row = self.curser_row.saturating_sub(1),
                    Message::MoveDown => self.curser_row += 1,
                    Message::Activate => self.activate(),
                    Message::Update => self.run_action(ActionKind::Update),
                    Message::Delete => self.run_action(ActionKind::Delete),
                    Message::CopyRow => self.copy_table_row(),
                    Message::CopyCell => self.copy_table_cell(),
                    Message::Reload => self.reload(),
                    Message::Help => self.show_help(),
                    _ => (),
                },
                Modus::POPUP => match msg {
                    Message::Quit => self.quit(),
                    Message::Exit | Message::Help => self.exit(),
                    _ => (),
                },
                Modus::CMDINPUT => {
                    if let Message::RawKey(key) = msg {
                        self.raw_input(key)
                    }
                }
            }
        }

        self.clamp_curser();
        self.update_uidata();
        Ok(())
    }

    // -------------------- Data source ---------------------- //

    fn reload(&mut self) {
        // At most one fetch in flight, a retry waits for the current one
        if self.fetch.is_some() {
            debug!("Fetch still running, ignoring reload");
            self.set_status_message("Still loading ...");
            return;
        }
        info!("Fetching posts from {}", self.source.describe());
        match Fetch::spawn(Arc::clone(&self.source)) {
            Ok(fetch) => {
                self.fetch = Some(fetch);
                self.status = Status::LOADING;
                self.load_error = None;
                self.set_status_message("Loading ...");
            }
            Err(e) => self.load_failed(e),
        }
    }

    fn sync_fetch(&mut self) {
        let Some(result) = self.fetch.as_ref().and_then(|f| f.poll()) else {
            return;
        };
        self.fetch = None;
        match result {
            Ok(posts) => {
                let n = posts.len();
                self.engine.set_records(Arc::new(posts));
                self.status = Status::READY;
                self.load_error = None;
                self.set_status_message(format!("Loaded {n} posts"));
            }
            Err(e) => self.load_failed(e),
        }
    }

    fn load_failed(&mut self, err: TVError) {
        error!("Loading posts failed: {err}");
        self.status = Status::FAILED;
        self.load_error = Some(err.to_string());
        self.set_status_message("Failed to load posts, press r to retry");
    }

    // -------------------- Control handling functions ---------------------- //

    fn exit(&mut self) {
        if self.modus == Modus::POPUP {
            trace!("Close popup ...");
            self.modus = self.previous_modus;
            self.previous_modus = Modus::POPUP;
        }
    }

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::POPUP;
    }

    fn enter_cmd_mode(&mut self, mode: CMDMode) {
        trace!("Entering command mode ...");
        self.previous_modus = self.modus;
        self.modus = Modus::CMDINPUT;
        self.cmd_mode = Some(mode);
        self.active_cmdinput = true;
        self.input.clear();
        self.last_input = self.input.get();
    }

    fn raw_input(&mut self, key: KeyEvent) {
        if self.active_cmdinput {
            self.last_input = self.input.read(key);
            if self.last_input.finished {
                self.handle_cmd_input();
            }
        }
    }

    fn handle_cmd_input(&mut self) {
        trace!("Handle cmd input {}", self.last_input.input);
        self.active_cmdinput = false;
        self.modus = self.previous_modus;
        self.previous_modus = Modus::CMDINPUT;

        if !self.last_input.canceled {
            match self.cmd_mode {
                Some(CMDMode::PageJump) => match self.last_input.page_number() {
                    Some(page) => {
                        self.engine.set_page_index(page - 1);
                        self.set_status_message(format!(
                            "Page {}/{}",
                            self.engine.page_index() + 1,
                            self.engine.page_count()
                        ));
                    }
                    None => self.set_status_message("Not a page number!"),
                },
                None => info!("Cmd mode is none!"),
            }
        }
        self.cmd_mode = None;
    }

    fn step_page_size(&mut self, step: isize) -> Result<(), TVError> {
        let current = PAGE_SIZES
            .iter()
            .position(|&s| s == self.page_size)
            .unwrap_or(0);
        let next = current
            .saturating_add_signed(step)
            .min(PAGE_SIZES.len() - 1);
        let page_size = PAGE_SIZES[next];
        if page_size != self.page_size {
            self.engine.set_page_size(page_size)?;
            self.page_size = page_size;
            self.curser_row = 0;
            self.set_status_message(format!("Showing {page_size} rows per page"));
        }
        Ok(())
    }

    fn move_column_selection(&mut self, step: isize) {
        let ncolumns = self.engine.columns().len() as isize;
        self.curser_column = (self.curser_column as isize + step).rem_euclid(ncolumns) as usize;
    }

    fn toggle_sort_current_column(&mut self) {
        let column = &self.engine.columns()[self.curser_column];
        let key = column.key;
        let name = column.header_text();
        if self.engine.toggle_sort(key) {
            self.curser_row = 0;
            let state = match self.engine.sort_state(key) {
                Some(SortDirection::Ascending) => "ascending",
                Some(SortDirection::Descending) => "descending",
                None => "unsorted",
            };
            self.set_status_message(format!("Sorted {name} {state}"));
        } else {
            self.set_status_message("This column can not be sorted");
        }
    }

    fn selected_post(&self) -> Option<&Post> {
        self.engine.page_rows().get(self.curser_row).copied()
    }

    fn activate(&mut self) {
        match self.engine.columns()[self.curser_column].action() {
            Some(kind) => self.run_action(kind),
            None => trace!("Nothing to activate in column {}", self.curser_column),
        }
    }

    fn run_action(&mut self, kind: ActionKind) {
        let Some(id) = self.selected_post().map(|p| p.id) else {
            debug!("No row selected for {kind}");
            return;
        };
        self.actions.dispatch(kind, id);
        self.set_status_message(format!("{kind}: {id}"));
    }

    fn clamp_curser(&mut self) {
        let nrows = self.engine.page().rows.len();
        self.curser_row = std::cmp::min(self.curser_row, nrows.saturating_sub(1));
    }

    fn wrap_cell_content(c: &str) -> String {
        let needs_escaping = c.contains('"');
        let needs_wrapping = c.chars().any(|c| c == ' ' || c == '\t' || c == ',');
        let mut out = String::from(c);

        if needs_escaping {
            out = out.replace('"', "\"\"");
        }
        if needs_wrapping {
            out = format!("\"{out}\"");
        }
        out
    }

    fn copy_to_clipboard(&mut self, content: String) {
        if self.clipboard.is_none() {
            match Clipboard::new() {
                Ok(clipboard) => self.clipboard = Some(clipboard),
                Err(e) => {
                    debug!("Clipboard unavailable: {e:?}");
                    self.set_status_message("Clipboard is not available!");
                    return;
                }
            }
        }
        if let Some(clipboard) = self.clipboard.as_mut() {
            match clipboard.set_text(content) {
                Ok(_) => {
                    trace!("Copied content to clipboard.");
                    self.set_status_message("Copied to clipboard");
                }
                Err(e) => trace!("Error copying to clipboard: {:?}", e),
            }
        }
    }

    fn copy_table_row(&mut self) {
        let Some(post) = self.selected_post() else {
            return;
        };
        let content = self
            .engine
            .columns()
            .iter()
            .filter(|c| c.is_sortable())
            .map(|c| Model::wrap_cell_content(&c.render(post)))
            .collect::<Vec<String>>()
            .join(",");
        self.copy_to_clipboard(content);
    }

    fn copy_table_cell(&mut self) {
        let Some(post) = self.selected_post() else {
            return;
        };
        let cell = self.engine.columns()[self.curser_column].render(post);
        trace!("Cell content: {}", cell);
        self.copy_to_clipboard(cell);
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
    }

    // -------------------- UI data ---------------------- //

    fn get_visible_name(name: &str, width: usize) -> String {
        if name.chars().count() <= width {
            return name.to_string();
        }
        if width < 3 {
            return String::new();
        }
        let mut reduced: String = name.chars().take(width - 3).collect();
        reduced.push_str("...");
        reduced
    }

    fn update_uidata(&mut self) {
        let max_width = self.config.max_column_width;
        let columns = self.engine.columns();

        let headers = columns
            .iter()
            .map(|c| HeaderView {
                name: Self::get_visible_name(&c.header_text(), max_width),
                min_width: c.min_width,
                grow: c.grow,
                sort: self.engine.sort_state(c.key),
            })
            .collect();

        let rows = self
            .engine
            .page_rows()
            .into_iter()
            .map(|post| {
                columns
                    .iter()
                    .map(|c| {
                        let cell = c.render(post).replace("\r\n", " ↵ ").replace('\n', " ↵ ");
                        Self::get_visible_name(&cell, max_width)
                    })
                    .collect()
            })
            .collect();

        let page = self.engine.page();
        self.uidata = UIData {
            name: "Post Table".to_string(),
            source: self.source.describe(),
            status: self.status.clone(),
            error: self.load_error.clone(),
            headers,
            rows,
            page_index: page.page_index,
            page_count: page.page_count,
            total_rows: page.total_rows,
            can_previous: page.can_previous_page(),
            can_next: page.can_next_page(),
            page_size: self.page_size,
            selected_row: self.curser_row,
            selected_column: self.curser_column,
            show_popup: self.modus == Modus::POPUP,
            popup_message: HELP_TEXT.to_string(),
            cmdinput: self.last_input.clone(),
            cmd_mode: self.cmd_mode,
            active_cmdinput: self.active_cmdinput,
            status_message: self.status_message.clone(),
        };
    }
}
