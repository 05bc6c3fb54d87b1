use tabled::{Table, Tabled};

use crate::infrastructure::serial::PortSummary;

#[derive(Tabled)]
struct PortTableRow {
    port: String,
    r#type: String,
    description: String,
}

impl From<&PortSummary> for PortTableRow {
    fn from(port: &PortSummary) -> Self {
        Self {
            port: port.name.clone(),
            r#type: port.kind.clone(),
            description: port.description.clone(),
        }
    }
}

/// Text shown by `--list-ports`
pub fn format_ports(ports: &[PortSummary]) -> String {
    if ports.is_empty() {
        return "No serial ports found".to_string();
    }
    let rows: Vec<PortTableRow> = ports.iter().map(PortTableRow::from).collect();
    Table::new(rows).to_string()
}

pub fn print_ports(ports: &[PortSummary]) {
    println!("{}", format_ports(ports));
}
