use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Position, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::border,
    text::{Line, Span, Text},
    widgets::{Block, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
};

use crate::domain::{CMDMode, PAGE_SIZES};
use crate::model::{Model, Status, UIData};

pub const CMDLINE_HEIGH: u16 = 1;
pub const TABLE_HEADER_HEIGHT: u16 = 1;
const SUMMARY_HEIGHT: u16 = 2;
const CONTROL_BAR_HEIGHT: u16 = 1;
const HIGHLIGHT_SYMBOL: &str = "► ";

#[derive(Debug, Default)]
pub struct TableUI {
    table_state: TableState,
}

impl TableUI {
    pub fn new() -> Self {
        Self {
            table_state: TableState::default(),
        }
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let uidata = model.get_uidata();

        let title = Line::from(format!(" {} ", uidata.name).bold());
        let instructions = Line::from(vec![
            " Page ".into(),
            "<n/p>".blue().bold(),
            " Sort ".into(),
            "<Tab/s>".blue().bold(),
            " Size ".into(),
            "<+/->".blue().bold(),
            " Help ".into(),
            "<?>".blue().bold(),
            " Quit ".into(),
            "<q> ".blue().bold(),
        ]);
        let block = Block::bordered()
            .title(title.centered())
            .title_bottom(instructions.centered())
            .border_set(border::THICK);
        let inner = block.inner(frame.area());
        frame.render_widget(block, frame.area());

        let [summary_area, controls_area, table_area, cmdline_area] = Layout::vertical([
            Constraint::Length(SUMMARY_HEIGHT),
            Constraint::Length(CONTROL_BAR_HEIGHT),
            Constraint::Min(TABLE_HEADER_HEIGHT + 1),
            Constraint::Length(CMDLINE_HEIGH),
        ])
        .areas(inner);

        frame.render_widget(Self::summary(uidata), summary_area);
        frame.render_widget(Paragraph::new(Self::control_bar(uidata)), controls_area);

        match uidata.status {
            Status::LOADING if uidata.rows.is_empty() => {
                let text = format!("Loading posts from {} ...", uidata.source);
                frame.render_widget(Paragraph::new(text.yellow()).centered(), table_area);
            }
            _ => self.draw_table(uidata, frame, table_area),
        }

        self.draw_cmdline(uidata, frame, cmdline_area);

        if uidata.show_popup {
            Self::draw_popup(uidata, frame);
        }
    }

    fn summary(uidata: &UIData) -> Text<'static> {
        let mut first = vec![
            "Rows Number: ".into(),
            Span::styled(uidata.rows.len().to_string(), Style::new().bold()),
            "  of ".into(),
            Span::raw(uidata.total_rows.to_string()),
            " posts".into(),
        ];
        if let Some(err) = &uidata.error {
            first.push("  Failed to load posts: ".red().bold());
            first.push(Span::styled(err.clone(), Style::new().fg(Color::Red)));
            first.push(" (r to retry)".red());
        }
        Text::from(vec![
            Line::from(first),
            Line::from(vec![
                "Page Count: ".into(),
                Span::styled(uidata.page_count.to_string(), Style::new().bold()),
            ]),
        ])
    }

    fn control_bar(uidata: &UIData) -> Line<'static> {
        let button = |label: &'static str, enabled: bool| {
            if enabled {
                Span::styled(label, Style::new().bold())
            } else {
                Span::styled(label, Style::new().add_modifier(Modifier::DIM))
            }
        };

        let mut spans = vec![
            button("◀ Previous", uidata.can_previous),
            " ".into(),
            button("Next ▶", uidata.can_next),
            "  ".into(),
        ];
        for index in 0..uidata.page_count {
            let label = format!(" {} ", index + 1);
            if index == uidata.page_index {
                spans.push(Span::styled(label, Style::new().reversed()));
            } else {
                spans.push(Span::raw(label));
            }
        }
        spans.push("  Page size:".into());
        for size in PAGE_SIZES {
            let label = format!(" {size} ");
            if size == uidata.page_size {
                spans.push(Span::styled(label, Style::new().reversed().yellow()));
            } else {
                spans.push(Span::raw(label));
            }
        }
        Line::from(spans)
    }

    fn draw_table(&mut self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let header = Row::new(uidata.headers.iter().enumerate().map(|(cidx, h)| {
            let glyph = h.sort.map(|s| s.glyph()).unwrap_or("");
            let cell = Cell::from(format!("{}{}", h.name, glyph));
            if cidx == uidata.selected_column {
                cell.style(Style::new().fg(Color::Black).bg(Color::Yellow))
            } else {
                cell
            }
        }))
        .style(Style::new().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .height(TABLE_HEADER_HEIGHT);

        let rows = uidata
            .rows
            .iter()
            .map(|r| Row::new(r.iter().map(|c| Cell::from(c.as_str()))));

        let widths = uidata.headers.iter().map(|h| {
            if h.grow {
                Constraint::Fill(1)
            } else {
                Constraint::Length(h.min_width)
            }
        });

        let table = Table::new(rows, widths)
            .header(header)
            .column_spacing(1)
            .row_highlight_style(Style::new().fg(Color::Black).bg(Color::Cyan))
            .highlight_symbol(HIGHLIGHT_SYMBOL);

        if uidata.rows.is_empty() {
            self.table_state.select(None);
        } else {
            self.table_state.select(Some(uidata.selected_row));
        }
        frame.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn draw_cmdline(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        if uidata.active_cmdinput {
            let prompt = match uidata.cmd_mode {
                Some(CMDMode::PageJump) => "Go to page: ",
                None => "> ",
            };
            let line = Line::from(vec![
                prompt.bold(),
                Span::raw(uidata.cmdinput.input.clone()),
            ]);
            frame.render_widget(Paragraph::new(line), area);
            frame.set_cursor_position(Position::new(
                area.x + (prompt.len() + uidata.cmdinput.curser_pos) as u16,
                area.y,
            ));
        } else {
            let line = Line::from(vec![
                Span::styled(
                    format!("{} ", uidata.source),
                    Style::new().add_modifier(Modifier::DIM),
                ),
                Span::raw(uidata.status_message.clone()),
            ]);
            frame.render_widget(Paragraph::new(line), area);
        }
    }

    fn draw_popup(uidata: &UIData, frame: &mut Frame) {
        let height = uidata.popup_message.lines().count() as u16 + 2;
        let width = uidata
            .popup_message
            .lines()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0) as u16
            + 4;
        let area = popup_area(frame.area(), width, height);
        let popup = Paragraph::new(uidata.popup_message.clone())
            .wrap(Wrap { trim: false })
            .block(Block::bordered().title(Line::from(" Help ").centered()));
        frame.render_widget(Clear, area);
        frame.render_widget(popup, area);
    }
}

fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let [area] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    area
}
