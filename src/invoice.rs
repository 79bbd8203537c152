//! Invoice

use std::{fmt::Write as _, io};

use jiff::Timestamp;
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    orders::{Order, TrackingUpdate},
    pricing::PricingError,
};

/// Errors that can occur when writing an invoice.
#[derive(Debug, Error)]
pub enum InvoiceError {
    /// Error calculating a line total.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// Error writing to the output.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Printable view of an order.
#[derive(Debug, Clone, Copy)]
pub struct Invoice<'o, 'a> {
    order: &'o Order<'a>,
}

impl<'o, 'a> Invoice<'o, 'a> {
    /// Invoice for an order.
    #[must_use]
    pub fn from_order(order: &'o Order<'a>) -> Self {
        Self { order }
    }

    /// Order being invoiced
    #[must_use]
    pub fn order(&self) -> &'o Order<'a> {
        self.order
    }

    /// Writes the header, line items and totals.
    ///
    /// # Errors
    ///
    /// Returns an error if a line total overflows or the output can't be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), InvoiceError> {
        write_invoice_header(&mut out, self.order)?;

        let mut builder = Builder::default();

        builder.push_record(["", "Item", "SKU", "Qty", "Unit Price", "Line Total"]);

        for (idx, line) in self.order.lines().iter().enumerate() {
            builder.push_record([
                format!("#{:<3}", idx + 1),
                line.name.clone(),
                line.product_id.to_string(),
                line.quantity.to_string(),
                line.unit_price.to_string(),
                line.total()?.to_string(),
            ]);
        }

        let mut table = builder.build();

        table.with(bordered_theme());
        table.modify(Rows::first(), Color::BOLD);
        table.modify(Columns::new(3..6), Alignment::right());

        writeln!(out, "\n{}", colorize_borders(&table.to_string()))?;

        write_totals(&mut out, self.order)
    }

    /// Writes the order's tracking history, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the output can't be written.
    pub fn write_tracking_to(&self, mut out: impl io::Write) -> Result<(), InvoiceError> {
        let mut builder = Builder::default();

        builder.push_record(["Status", "Description", "When", "Location"]);

        for update in self.order.tracking() {
            builder.push_record(tracking_row(update));
        }

        let mut table = builder.build();

        table.with(bordered_theme());
        table.modify(Rows::first(), Color::BOLD);

        writeln!(out, "{}", colorize_borders(&table.to_string()))?;

        Ok(())
    }
}

fn write_invoice_header(out: &mut impl io::Write, order: &Order<'_>) -> Result<(), InvoiceError> {
    let purchaser = order.purchaser();

    writeln!(out, "\x1b[1mInvoice {}\x1b[0m", order.id())?;
    writeln!(out, "Purchaser:           {} <{}>", purchaser.name, purchaser.email)?;
    writeln!(out, "Ordered:             {}", format_time(order.ordered_at()))?;
    writeln!(
        out,
        "Estimated delivery:  {}",
        format_time(order.estimated_delivery())
    )?;
    writeln!(out, "Status:              {}", order.status())?;
    writeln!(
        out,
        "Payment:             {} ({})",
        order.payment_method(),
        order.payment_status()
    )?;
    writeln!(out, "Ship to:             {}", order.shipping_address())?;

    Ok(())
}

fn write_totals(out: &mut impl io::Write, order: &Order<'_>) -> Result<(), InvoiceError> {
    let shipping = if order.shipping().is_zero() {
        "Free".to_string()
    } else {
        order.shipping().to_string()
    };

    let rows = [
        (" Subtotal:".to_string(), format!("{}  ", order.subtotal())),
        (" Tax:".to_string(), format!("{}  ", order.tax())),
        (" Shipping:".to_string(), format!("{shipping}  ")),
        (
            " \x1b[1mTotal:\x1b[0m".to_string(),
            format!("\x1b[1m{}\x1b[0m  ", order.total()),
        ),
    ];

    let label_width = rows
        .iter()
        .map(|(label, _)| visible_width(label))
        .max()
        .unwrap_or_default();

    let value_width = rows
        .iter()
        .map(|(_, value)| visible_width(value))
        .max()
        .unwrap_or_default();

    for (label, value) in &rows {
        write_summary_line(out, label, value, label_width, value_width)?;
    }

    writeln!(out)?;

    Ok(())
}

fn tracking_row(update: &TrackingUpdate) -> [String; 4] {
    [
        update.status.to_string(),
        update.description.clone(),
        format_time(update.timestamp),
        update.location.clone().unwrap_or_default(),
    ]
}

fn format_time(timestamp: Timestamp) -> String {
    timestamp.strftime("%Y-%m-%d %H:%M UTC").to_string()
}

fn bordered_theme() -> Theme {
    let mut theme = Theme::from(Style::modern_rounded());

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(
        1,
        HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤')),
    );

    theme
}

/// Wraps runs of box-drawing characters (U+2500..U+257F) in ANSI dark-grey escape codes.
fn colorize_borders(table: &str) -> String {
    let mut out = String::with_capacity(table.len() + 256);
    let mut in_run = false;

    for ch in table.chars() {
        let box_char = ('\u{2500}'..='\u{257F}').contains(&ch);

        if box_char && !in_run {
            _ = out.write_str("\x1b[90m");
            in_run = true;
        } else if !box_char && in_run {
            _ = out.write_str("\x1b[0m");
            in_run = false;
        }

        out.push(ch);
    }

    if in_run {
        _ = out.write_str("\x1b[0m");
    }

    out
}

/// Width of a string ignoring ANSI escape sequences.
fn visible_width(s: &str) -> usize {
    let mut width = 0usize;
    let mut in_escape = false;

    for ch in s.chars() {
        if in_escape {
            if ch.is_ascii_alphabetic() {
                in_escape = false;
            }
        } else if ch == '\x1b' {
            in_escape = true;
        } else {
            width += 1;
        }
    }

    width
}

fn write_summary_line(
    out: &mut impl io::Write,
    label: &str,
    value: &str,
    label_col_width: usize,
    value_col_width: usize,
) -> Result<(), InvoiceError> {
    let label_pad = label_col_width.saturating_sub(visible_width(label));
    let value_pad = value_col_width.saturating_sub(visible_width(value));

    writeln!(
        out,
        "{:>label_pad$}{label}  {}{value}",
        "",
        " ".repeat(value_pad)
    )?;

    Ok(())
}
