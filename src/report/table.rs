//! Plain-text tables for terminal output.
//!
//! One renderer per record type. Columns are fixed width; long text is
//! truncated with an ellipsis.

use crate::checkpoint::{CheckpointDocument, CheckpointEntry};
use crate::model::{Accident, Apartment, Client, Policy};
use crate::store::queries::{CityCount, PolicyWithClient};

fn rule(width: usize) -> String {
    format!("{}\n", "-".repeat(width))
}

pub fn clients(rows: &[Client]) -> String {
    if rows.is_empty() {
        return String::from("No clients.\n");
    }

    let mut output = format!(
        "{:<12} {:<24} {:<20} {:<10} {:<6}\n",
        "CPF", "Name", "Contact", "Born", "Sex"
    );
    output.push_str(&rule(76));
    for c in rows {
        output.push_str(&format!(
            "{:<12} {:<24} {:<20} {:<10} {:<6}\n",
            c.cpf,
            truncate(&c.name, 24),
            truncate(&c.contact, 20),
            c.birth_date,
            truncate(&c.sex, 6)
        ));
    }
    output
}

pub fn policies(rows: &[Policy]) -> String {
    if rows.is_empty() {
        return String::from("No policies.\n");
    }

    let mut output = format!(
        "{:<12} {:<10} {:>10} {:<24} {:<12}\n",
        "Number", "Start", "Monthly", "Coverage", "Client"
    );
    output.push_str(&rule(72));
    for p in rows {
        output.push_str(&format!(
            "{:<12} {:<10} {:>10} {:<24} {:<12}\n",
            truncate(&p.policy_number, 12),
            p.start_date,
            p.monthly_value,
            truncate(&p.coverage, 24),
            p.client_cpf
        ));
    }
    output
}

pub fn apartments(rows: &[Apartment]) -> String {
    if rows.is_empty() {
        return String::from("No apartments.\n");
    }

    let mut output = format!(
        "{:<28} {:<16} {:>6} {:<12} {:>12} {:>9}\n",
        "Address", "City", "Area", "Policy", "Value", "Residents"
    );
    output.push_str(&rule(88));
    for a in rows {
        output.push_str(&format!(
            "{:<28} {:<16} {:>6} {:<12} {:>12} {:>9}\n",
            truncate(&a.address, 28),
            truncate(&a.city, 16),
            a.area,
            truncate(&a.policy_number, 12),
            a.market_value,
            a.residents
        ));
    }
    output
}

pub fn accidents(rows: &[Accident]) -> String {
    if rows.is_empty() {
        return String::from("No accidents.\n");
    }

    let mut output = format!(
        "{:>6} {:<10} {:>5} {:<28} {:<30} {:>8}\n",
        "ID", "Date", "Count", "Apartment", "Description", "Involved"
    );
    output.push_str(&rule(92));
    for a in rows {
        output.push_str(&format!(
            "{:>6} {:<10} {:>5} {:<28} {:<30} {:>8}\n",
            a.accident_id,
            a.date,
            a.accident_count,
            truncate(&a.apartment_address, 28),
            truncate(&a.description, 30),
            a.involved
        ));
    }
    output
}

pub fn policies_with_clients(rows: &[PolicyWithClient]) -> String {
    if rows.is_empty() {
        return String::from("No policies.\n");
    }

    let mut output = format!("{:<12} {:>10} {:<12} {:<24}\n", "Policy", "Monthly", "CPF", "Holder");
    output.push_str(&rule(60));
    for row in rows {
        output.push_str(&format!(
            "{:<12} {:>10} {:<12} {:<24}\n",
            truncate(&row.policy.policy_number, 12),
            row.policy.monthly_value,
            row.client.cpf,
            truncate(&row.client.name, 24)
        ));
    }
    output
}

pub fn city_counts(rows: &[CityCount]) -> String {
    if rows.is_empty() {
        return String::from("No apartments.\n");
    }

    let mut output = format!("{:<24} {:>10}\n", "City", "Apartments");
    output.push_str(&rule(35));
    for row in rows {
        output.push_str(&format!("{:<24} {:>10}\n", truncate(&row.city, 24), row.apartments));
    }
    output
}

pub fn checkpoints(rows: &[CheckpointEntry]) -> String {
    if rows.is_empty() {
        return String::from("No checkpoints found. Run 'claimbook checkpoint save <NAME>' to create one.\n");
    }

    let mut output = format!(
        "{:<24} {:<20} {:>8} {:>8} {:>10} {:>9}\n",
        "Name", "Created", "Clients", "Policies", "Apartments", "Accidents"
    );
    output.push_str(&rule(84));
    for entry in rows {
        let name = truncate(&entry.name, 24);
        let created = super::format_timestamp(entry.created_at);
        match entry.counts {
            Some(counts) => output.push_str(&format!(
                "{:<24} {:<20} {:>8} {:>8} {:>10} {:>9}\n",
                name, created, counts.clients, counts.policies, counts.apartments, counts.accidents
            )),
            None => output.push_str(&format!("{name:<24} {created:<20} (unreadable)\n")),
        }
    }
    output
}

/// Every table of a stored checkpoint, one section each.
pub fn checkpoint_document(docs: &[CheckpointDocument]) -> String {
    let mut output = String::new();
    for doc in docs {
        output.push_str(&format!("Clients ({})\n", doc.clients.len()));
        output.push_str(&clients(&doc.clients));
        output.push_str(&format!("\nPolicies ({})\n", doc.policies.len()));
        output.push_str(&policies(&doc.policies));
        output.push_str(&format!("\nApartments ({})\n", doc.apartments.len()));
        output.push_str(&apartments(&doc.apartments));
        output.push_str(&format!("\nAccidents ({})\n", doc.accidents.len()));
        output.push_str(&accidents(&doc.accidents));
    }
    output
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{truncated}...")
    }
}
