use console::{style, Style};
use resview_core::category::Category;
use resview_core::consts::DIGIT_GROUP_SEPARATOR;
use resview_core::control::{Cell, CellStyle, Column, Row};
use resview_core::view::{PanelTitle, Selection};

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    active: Style,
    network: Style,
    suffix: Style,
    separator: Style,
    unit: Style,
    disabled: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            active: Style::new().green().bold().underlined(),
            network: Style::new().blue(),
            suffix: Style::new().yellow(),
            separator: Style::new().dim(),
            unit: Style::new().green(),
            disabled: Style::new().dim().yellow(),
        }
    }
}

pub fn print_store_summary(files: &[String], runs: &[String], titles: &[PanelTitle]) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Result Files"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(12)));
    println!();
    for file in files {
        println!("  {:<10}{}", s.label.apply_to("File"), s.value.apply_to(file));
    }
    if runs.is_empty() {
        println!("  {:<10}{}", s.label.apply_to("Runs"), s.disabled.apply_to("none"));
    } else {
        for run in runs {
            println!("  {:<10}{}", s.label.apply_to("Run"), s.value.apply_to(run));
        }
    }
    println!();

    println!("  {}", s.header.apply_to("Categories"));
    for title in titles {
        println!(
            "    {:<14}{}",
            s.label.apply_to(title.category),
            s.value.apply_to(title.count)
        );
    }
    println!();
}

/// Tab bar with the active category highlighted.
pub fn print_panel_titles(titles: &[PanelTitle], active: Category) {
    let s = Styles::new();
    let tabs: Vec<String> = titles
        .iter()
        .map(|t| {
            if t.category == active {
                s.active.apply_to(t).to_string()
            } else {
                s.label.apply_to(t).to_string()
            }
        })
        .collect();
    println!();
    println!("  {}", tabs.join("  "));
    println!();
}

/// Print table rows under `columns`, or tree rows indented by depth when
/// `columns` is empty.
pub fn print_rows(columns: &[Column], rows: &[Row]) {
    let s = Styles::new();

    if columns.is_empty() {
        for row in rows {
            let indent = "  ".repeat(row.depth);
            let cells: Vec<String> = row.cells.iter().map(|c| render_cell(&s, c)).collect();
            if row.id.is_none() {
                println!("  {indent}{}", s.header.apply_to(cells.join("")));
            } else {
                println!("  {indent}{}", cells.join("  "));
            }
        }
        return;
    }

    let mut widths: Vec<usize> = columns.iter().map(|c| c.title().chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(&row.cells) {
            *width = (*width).max(cell.text.chars().count());
        }
    }

    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!("{:<w$}", c.title(), w = *w))
        .collect();
    println!("  {}", s.header.apply_to(header.join("  ")));
    let rule_width = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
    println!("  {}", "-".repeat(rule_width));

    for row in rows {
        let cells: Vec<String> = row
            .cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| {
                let pad = w.saturating_sub(cell.text.chars().count());
                format!("{}{}", render_cell(&s, cell), " ".repeat(pad))
            })
            .collect();
        println!("  {}", cells.join("  "));
    }
}

pub fn print_selection(status: &str, selection: &Selection) {
    let s = Styles::new();

    println!();
    println!("  {}", s.label.apply_to(status));
    if selection.is_empty() {
        return;
    }
    let kinds: Vec<String> = selection.kinds.iter().map(|k| k.to_string()).collect();
    println!(
        "  {:<10}{}",
        s.label.apply_to("Kinds"),
        s.value.apply_to(kinds.join(", "))
    );
    let ids: Vec<String> = selection.ids.iter().map(|id| id.to_string()).collect();
    println!(
        "  {:<10}{}",
        s.label.apply_to("Items"),
        style(ids.join(" ")).dim()
    );
}

fn render_cell(s: &Styles, cell: &Cell) -> String {
    cell.styles
        .iter()
        .fold(cell.text.clone(), |text, hint| apply_hint(s, *hint, &text))
}

fn apply_hint(s: &Styles, hint: CellStyle, text: &str) -> String {
    match hint {
        CellStyle::NetworkName => match text.split_once('.') {
            Some((network, rest)) => format!("{}.{rest}", s.network.apply_to(network)),
            None => s.network.apply_to(text).to_string(),
        },
        CellStyle::ResultSuffix => match text.rsplit_once(':') {
            Some((name, suffix)) => format!("{name}:{}", s.suffix.apply_to(suffix)),
            None => text.to_string(),
        },
        CellStyle::NumberSeparator => {
            let dimmed = s.separator.apply_to(DIGIT_GROUP_SEPARATOR).to_string();
            text.replace(DIGIT_GROUP_SEPARATOR, &dimmed)
        }
        CellStyle::MeasurementUnit => match text.rsplit_once(' ') {
            Some((number, unit)) => format!("{number} {}", s.unit.apply_to(unit)),
            None => s.unit.apply_to(text).to_string(),
        },
    }
}
