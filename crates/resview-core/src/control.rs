//! Per-category display controls.
//!
//! The ALL category is shown as a tree, every other category as a table.
//! The variant is picked once per category ([`DataControl::for_category`]);
//! both variants keep an id list, a row selection and the current
//! [`FormattingOptions`], and format rows only when asked for them.

use std::collections::HashSet;
use std::ops::Range;

use tracing::warn;

use crate::category::{Category, ControlKind};
use crate::consts::DIGIT_GROUP_SEPARATOR;
use crate::error::{ResViewError, Result};
use crate::formatting::{format_quantity, module_display, FormattingOptions};
use crate::idlist::IdList;
use crate::item::{Field, ItemId, ItemRef};
use crate::store::StoreSnapshot;

/// Colouring hint attached to a cell. Hosts decide how to render them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellStyle {
    NetworkName,
    ResultSuffix,
    NumberSeparator,
    MeasurementUnit,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cell {
    pub text: String,
    pub styles: Vec<CellStyle>,
}

impl Cell {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            styles: Vec::new(),
        }
    }

    fn styled(text: impl Into<String>, style: Option<CellStyle>) -> Self {
        Self {
            text: text.into(),
            styles: style.into_iter().collect(),
        }
    }
}

/// A formatted row. Group rows of the tree have no id.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    pub id: Option<ItemId>,
    pub depth: usize,
    pub cells: Vec<Cell>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Column {
    File,
    Run,
    Module,
    Name,
    Kind,
    Value,
    Unit,
    VectorId,
    Count,
    Mean,
    Stddev,
    Min,
    Max,
}

impl Column {
    pub fn title(self) -> &'static str {
        match self {
            Self::File => "File",
            Self::Run => "Run",
            Self::Module => "Module",
            Self::Name => "Name",
            Self::Kind => "Kind",
            Self::Value => "Value",
            Self::Unit => "Unit",
            Self::VectorId => "Id",
            Self::Count => "Count",
            Self::Mean => "Mean",
            Self::Stddev => "StdDev",
            Self::Min => "Min",
            Self::Max => "Max",
        }
    }

    /// Columns shown for a category until the user chooses otherwise.
    pub fn defaults_for(category: Category) -> Vec<Column> {
        use Column::*;
        match category {
            Category::All | Category::Scalars => vec![Run, Module, Name, Value, Unit],
            Category::Parameters => vec![Run, Module, Name, Value],
            Category::Vectors => vec![Run, Module, Name, VectorId, Count, Mean, Min, Max],
            Category::Histograms => vec![Run, Module, Name, Kind, Count, Mean, Stddev, Min, Max],
        }
    }

    /// Columns the "choose columns" dialog offers for a category.
    pub fn available_for(category: Category) -> Vec<Column> {
        use Column::*;
        match category {
            Category::All | Category::Scalars => vec![File, Run, Module, Name, Kind, Value, Unit],
            Category::Parameters => vec![File, Run, Module, Name, Value, Unit],
            Category::Vectors => vec![
                File, Run, Module, Name, VectorId, Unit, Count, Mean, Stddev, Min, Max,
            ],
            Category::Histograms => vec![
                File, Run, Module, Name, Kind, Unit, Count, Mean, Stddev, Min, Max,
            ],
        }
    }

    fn field(self) -> Option<Field> {
        match self {
            Self::Count => Some(Field::Count),
            Self::Mean => Some(Field::Mean),
            Self::Stddev => Some(Field::Stddev),
            Self::Min => Some(Field::Min),
            Self::Max => Some(Field::Max),
            _ => None,
        }
    }
}

/// Grouping level of the tree control.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TreeLevel {
    File,
    Run,
    Module,
}

impl TreeLevel {
    /// Level sequences offered by the "tree levels" dropdown.
    pub const PRESETS: [&'static [TreeLevel]; 4] = [
        &[TreeLevel::Run, TreeLevel::Module],
        &[TreeLevel::Module],
        &[TreeLevel::File, TreeLevel::Run, TreeLevel::Module],
        &[TreeLevel::Run],
    ];
}

/// State shared by both control variants.
#[derive(Clone, Debug, Default)]
struct ControlState {
    ids: IdList,
    /// Selected indices into `ids`, sorted and unique.
    selection: Vec<usize>,
    options: FormattingOptions,
}

impl ControlState {
    fn set_id_list(&mut self, ids: IdList) {
        // Keep selected items that survive the refresh.
        let selected: HashSet<ItemId> =
            self.selection.iter().filter_map(|&i| self.ids.get(i)).collect();
        self.selection = ids
            .iter()
            .enumerate()
            .filter(|(_, id)| selected.contains(id))
            .map(|(i, _)| i)
            .collect();
        self.ids = ids;
    }

    fn select(&mut self, rows: &[usize]) -> Result<()> {
        if let Some(&bad) = rows.iter().find(|&&r| r >= self.ids.len()) {
            return Err(ResViewError::RowIndexOutOfRange {
                index: bad,
                rows: self.ids.len(),
            });
        }
        let mut selection = rows.to_vec();
        selection.sort_unstable();
        selection.dedup();
        self.selection = selection;
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct TableControl {
    category: Category,
    state: ControlState,
    columns: Vec<Column>,
}

impl TableControl {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            state: ControlState::default(),
            columns: Column::defaults_for(category),
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Choose visible columns. Columns not offered for this category are
    /// dropped with a warning; returns the columns now visible.
    pub fn set_visible_columns(&mut self, columns: &[Column]) -> &[Column] {
        let available = Column::available_for(self.category);
        let mut visible = Vec::with_capacity(columns.len());
        for column in columns {
            if !available.contains(column) {
                warn!(category = %self.category, column = column.title(), "column not available, ignored");
            } else if !visible.contains(column) {
                visible.push(*column);
            }
        }
        self.columns = visible;
        &self.columns
    }

    fn rows(&self, snapshot: &StoreSnapshot<'_>, range: Range<usize>) -> Vec<Row> {
        let opts = &self.state.options;
        let end = range.end.min(self.state.ids.len());
        let start = range.start.min(end);
        self.state.ids.as_slice()[start..end]
            .iter()
            .filter_map(|id| snapshot.resolve(*id))
            .map(|item| Row {
                id: Some(item.id()),
                depth: 0,
                cells: self.columns.iter().map(|c| table_cell(&item, *c, opts)).collect(),
            })
            .collect()
    }
}

#[derive(Clone, Debug)]
pub struct TreeControl {
    state: ControlState,
    levels: Vec<TreeLevel>,
    flat_module_tree: bool,
}

impl Default for TreeControl {
    fn default() -> Self {
        Self {
            state: ControlState::default(),
            levels: TreeLevel::PRESETS[0].to_vec(),
            flat_module_tree: true,
        }
    }
}

impl TreeControl {
    pub fn levels(&self) -> &[TreeLevel] {
        &self.levels
    }

    pub fn set_levels(&mut self, levels: &[TreeLevel]) {
        let mut unique = Vec::with_capacity(levels.len());
        for level in levels {
            if !unique.contains(level) {
                unique.push(*level);
            }
        }
        self.levels = unique;
    }

    pub fn flat_module_tree(&self) -> bool {
        self.flat_module_tree
    }

    /// Flat: the module path is one tree node. Otherwise every path segment nests.
    pub fn set_flat_module_tree(&mut self, flat: bool) {
        self.flat_module_tree = flat;
    }

    /// Resolved leaves in display order: `(path, index into the id list, item)`.
    fn arrange<'s>(&self, snapshot: &StoreSnapshot<'s>) -> Vec<(Vec<String>, usize, ItemRef<'s>)> {
        let mut leaves: Vec<_> = self
            .state
            .ids
            .iter()
            .enumerate()
            .filter_map(|(i, id)| snapshot.resolve(id).map(|item| (self.path_of(&item), i, item)))
            .collect();
        leaves.sort_by(|a, b| a.0.cmp(&b.0));
        leaves
    }

    /// Map leaf positions in display order to id-list indices.
    fn list_indices(&self, snapshot: &StoreSnapshot<'_>, rows: &[usize]) -> Result<Vec<usize>> {
        let leaves = self.arrange(snapshot);
        rows.iter()
            .map(|&row| {
                leaves.get(row).map(|leaf| leaf.1).ok_or(ResViewError::RowIndexOutOfRange {
                    index: row,
                    rows: leaves.len(),
                })
            })
            .collect()
    }

    fn rows(&self, snapshot: &StoreSnapshot<'_>, range: Range<usize>) -> Vec<Row> {
        let opts = &self.state.options;
        // Levels before the module level contribute one segment each.
        let network_depth = self.levels.iter().position(|l| *l == TreeLevel::Module);
        let mut rows = Vec::new();
        let mut open: Vec<String> = Vec::new();
        let mut position = 0;
        for (path, _, item) in self.arrange(snapshot) {
            if position >= range.end {
                break;
            }
            let shared = open.iter().zip(&path).take_while(|(a, b)| a == b).count();
            open.truncate(shared);
            for (depth, segment) in path.iter().enumerate().skip(shared) {
                if range.contains(&position) {
                    let style = (opts.color_network_names
                        && opts.show_network_names
                        && network_depth == Some(depth))
                        .then_some(CellStyle::NetworkName);
                    rows.push(Row {
                        id: None,
                        depth,
                        cells: vec![Cell::styled(segment.clone(), style)],
                    });
                }
                open.push(segment.clone());
                position += 1;
            }
            if range.contains(&position) {
                rows.push(Row {
                    id: Some(item.id()),
                    depth: path.len(),
                    cells: vec![
                        table_cell(&item, Column::Name, opts),
                        table_cell(&item, Column::Value, opts),
                    ],
                });
            }
            position += 1;
        }
        rows
    }

    fn path_of(&self, item: &ItemRef<'_>) -> Vec<String> {
        let opts = &self.state.options;
        let mut path = Vec::new();
        for level in &self.levels {
            match level {
                TreeLevel::File => path.push(item.item().file.clone()),
                TreeLevel::Run => path.push(item.run().to_string()),
                TreeLevel::Module => {
                    let module = module_display(item.module(), opts);
                    if self.flat_module_tree {
                        path.push(module.to_string());
                    } else {
                        path.extend(module.split('.').map(str::to_string));
                    }
                }
            }
        }
        path
    }
}

/// Display control of one category.
#[derive(Clone, Debug)]
pub enum DataControl {
    Table(TableControl),
    Tree(TreeControl),
}

impl DataControl {
    pub fn for_category(category: Category) -> Self {
        match category.control_kind() {
            ControlKind::Tree => Self::Tree(TreeControl::default()),
            ControlKind::Table => Self::Table(TableControl::new(category)),
        }
    }

    fn state(&self) -> &ControlState {
        match self {
            Self::Table(t) => &t.state,
            Self::Tree(t) => &t.state,
        }
    }

    fn state_mut(&mut self) -> &mut ControlState {
        match self {
            Self::Table(t) => &mut t.state,
            Self::Tree(t) => &mut t.state,
        }
    }

    pub fn kind(&self) -> ControlKind {
        match self {
            Self::Table(_) => ControlKind::Table,
            Self::Tree(_) => ControlKind::Tree,
        }
    }

    pub fn as_table(&self) -> Option<&TableControl> {
        match self {
            Self::Table(t) => Some(t),
            Self::Tree(_) => None,
        }
    }

    pub fn as_table_mut(&mut self) -> Option<&mut TableControl> {
        match self {
            Self::Table(t) => Some(t),
            Self::Tree(_) => None,
        }
    }

    pub fn as_tree_mut(&mut self) -> Option<&mut TreeControl> {
        match self {
            Self::Tree(t) => Some(t),
            Self::Table(_) => None,
        }
    }

    pub fn id_list(&self) -> &IdList {
        &self.state().ids
    }

    pub fn set_id_list(&mut self, ids: IdList) {
        self.state_mut().set_id_list(ids);
    }

    pub fn item_count(&self) -> usize {
        self.state().ids.len()
    }

    pub fn selection_count(&self) -> usize {
        self.state().selection.len()
    }

    pub fn selected_rows(&self) -> &[usize] {
        &self.state().selection
    }

    pub fn selected_ids(&self) -> IdList {
        let state = self.state();
        state.ids.subset(&state.selection)
    }

    /// Select rows by their position among the displayed items: table rows,
    /// or tree leaves in display order (group rows are not counted).
    /// Rejects the whole request if any position is out of range.
    pub fn select_rows(&mut self, snapshot: &StoreSnapshot<'_>, rows: &[usize]) -> Result<()> {
        match self {
            Self::Table(t) => t.state.select(rows),
            Self::Tree(t) => {
                let indices = t.list_indices(snapshot, rows)?;
                t.state.select(&indices)
            }
        }
    }

    /// Select by index into the id list, regardless of display order.
    pub fn select_indices(&mut self, indices: &[usize]) -> Result<()> {
        self.state_mut().select(indices)
    }

    pub fn clear_selection(&mut self) {
        self.state_mut().selection.clear();
    }

    pub fn formatting_options(&self) -> &FormattingOptions {
        &self.state().options
    }

    pub fn set_formatting_options(&mut self, options: FormattingOptions) {
        self.state_mut().options = options;
    }

    /// Format the rows in `range`; the range is clamped to what exists.
    pub fn rows(&self, snapshot: &StoreSnapshot<'_>, range: Range<usize>) -> Vec<Row> {
        match self {
            Self::Table(t) => t.rows(snapshot, range),
            Self::Tree(t) => t.rows(snapshot, range),
        }
    }
}

fn table_cell(item: &ItemRef<'_>, column: Column, opts: &FormattingOptions) -> Cell {
    if let Some(field) = column.field() {
        return match item.item().fields.get(&field) {
            Some(v) if !matches!(item, ItemRef::Field { .. }) => number_cell(*v, opts),
            _ => Cell::default(),
        };
    }
    match column {
        Column::File => Cell::plain(item.item().file.clone()),
        Column::Run => Cell::plain(item.run()),
        Column::Module => {
            let style = (opts.show_network_names && opts.color_network_names)
                .then_some(CellStyle::NetworkName);
            Cell::styled(module_display(item.module(), opts), style)
        }
        Column::Name => {
            let name = item.name();
            let style = (opts.color_result_suffixes && name.contains(':'))
                .then_some(CellStyle::ResultSuffix);
            Cell::styled(name, style)
        }
        Column::Kind => Cell::plain(item.kind().to_string()),
        Column::Value => match (item.value(), &item.item().text) {
            (Some(v), _) => number_cell(v, opts),
            (None, Some(text)) if !matches!(item, ItemRef::Field { .. }) => Cell::plain(text.clone()),
            _ => Cell::default(),
        },
        Column::Unit => {
            let style = opts.color_measurement_units.then_some(CellStyle::MeasurementUnit);
            Cell::styled(item.unit().unwrap_or_default(), style)
        }
        Column::VectorId => Cell::plain(
            item.item()
                .vector_id
                .map(|v| v.to_string())
                .unwrap_or_default(),
        ),
        Column::Count | Column::Mean | Column::Stddev | Column::Min | Column::Max => Cell::default(),
    }
}

fn number_cell(value: f64, opts: &FormattingOptions) -> Cell {
    let text = format_quantity(value, None, opts);
    let style = (opts.color_number_separators && text.contains(DIGIT_GROUP_SEPARATOR))
        .then_some(CellStyle::NumberSeparator);
    Cell::styled(text, style)
}
