use std::fmt::Write;

use ansi_term::{Colour, Style};

use crate::{
    classify::Category,
    utils::time::{display_day, format_seconds},
};

use super::view::DashboardView;

const BAR_WIDTH: u64 = 40;

fn colour(category: Category) -> Colour {
    match category {
        Category::Productive => Colour::RGB(75, 192, 192),
        Category::Unproductive => Colour::RGB(255, 99, 132),
        Category::Neutral => Colour::RGB(201, 203, 207),
    }
}

fn glyph(category: Category) -> char {
    match category {
        Category::Productive => '█',
        Category::Unproductive => '▓',
        Category::Neutral => '░',
    }
}

/// Draws the view as text. Colours are optional so that the output stays readable when
/// piped.
pub struct Renderer {
    coloured: bool,
}

impl Renderer {
    pub fn new(coloured: bool) -> Self {
        Self { coloured }
    }

    fn paint(&self, style: Style, text: &str) -> String {
        if self.coloured {
            style.paint(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn segment(&self, category: Category, width: u64) -> String {
        let text = glyph(category).to_string().repeat(width as usize);
        self.paint(colour(category).normal(), &text)
    }

    pub fn error_banner(&self, message: &str) -> String {
        self.paint(Colour::Red.bold(), &format!("! {message}"))
    }

    pub fn render(&self, view: &DashboardView) -> String {
        let mut out = String::new();
        self.render_weekly(view, &mut out);
        out.push('\n');
        self.render_today(view, &mut out);
        out.push('\n');
        self.render_domains(view, &mut out);
        out
    }

    fn title(&self, text: &str) -> String {
        self.paint(Style::new().bold(), text)
    }

    fn render_weekly(&self, view: &DashboardView, out: &mut String) {
        let _ = writeln!(out, "{}", self.title("Weekly Time Breakdown"));

        let longest = view.weekly.iter().map(|day| day.total()).max().unwrap_or(0);
        for day in &view.weekly {
            let mut bar = String::new();
            if longest > 0 {
                for (category, seconds) in [
                    (Category::Productive, day.productive),
                    (Category::Unproductive, day.unproductive),
                    (Category::Neutral, day.neutral),
                ] {
                    bar += &self.segment(category, seconds * BAR_WIDTH / longest);
                }
            }
            let _ = writeln!(
                out,
                "{:>7} {} {}",
                display_day(&day.date),
                bar,
                format_seconds(day.total())
            );
        }

        let legend = Category::ALL
            .into_iter()
            .map(|category| format!("{} {category}", self.segment(category, 1)))
            .collect::<Vec<_>>()
            .join("  ");
        let _ = writeln!(out, "        {legend}");
    }

    fn render_today(&self, view: &DashboardView, out: &mut String) {
        let _ = writeln!(
            out,
            "{}",
            self.title(&format!("Today's Productivity ({})", display_day(&view.today)))
        );
        for share in &view.today_shares {
            let width = (*share.percentage * BAR_WIDTH as f64 / 100.).round() as u64;
            let _ = writeln!(
                out,
                "{:<13} {:<40} {} ({})",
                share.category.to_string(),
                self.segment(share.category, width),
                format_seconds(share.seconds),
                share.percentage
            );
        }
    }

    fn render_domains(&self, view: &DashboardView, out: &mut String) {
        let _ = writeln!(out, "{}", self.title("Top Domains"));
        if view.top_domains.is_empty() {
            let _ = writeln!(out, "  No browsing data collected yet");
            return;
        }

        let width = view
            .top_domains
            .iter()
            .map(|row| row.domain.len())
            .max()
            .unwrap_or(0)
            .max("Domain".len());
        let _ = writeln!(out, "  {:<width$}  {:>8}  Category", "Domain", "Time");
        for row in &view.top_domains {
            let _ = writeln!(
                out,
                "  {:<width$}  {:>8}  {}",
                row.domain,
                format_seconds(row.seconds),
                self.paint(colour(row.category).normal(), &row.category.to_string())
            );
        }
    }
}
