use super::entity::{ActionOrigin, EntityConfig};
use crate::models::{Record, ReviewStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeTone {
    Positive,
    Neutral,
    Negative,
}

impl BadgeTone {
    pub fn for_status(status: &str) -> Self {
        match status {
            "Approved" | "Confirmed" => BadgeTone::Positive,
            "Pending" => BadgeTone::Neutral,
            _ => BadgeTone::Negative,
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            BadgeTone::Positive => "badge badge-positive",
            BadgeTone::Neutral => "badge badge-neutral",
            BadgeTone::Negative => "badge badge-negative",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub label: String,
    pub tone: BadgeTone,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionButton {
    pub status: &'static str,
    pub label: &'static str,
    pub origin: &'static str,
    pub class: &'static str,
}

/// A column value as rendered: either plain text or a status badge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub badge: Option<Badge>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub id: String,
    pub cells: Vec<Cell>,
    pub actions: Vec<ActionButton>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    pub headers: Vec<&'static str>,
    pub rows: Vec<RowView>,
    pub has_actions: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailField {
    pub label: &'static str,
    pub cell: Cell,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailView {
    pub id: String,
    pub title: String,
    pub fields: Vec<DetailField>,
    pub actions: Vec<ActionButton>,
}

fn cell(entity: &EntityConfig, record: &Record, field: &str) -> Cell {
    let text = record.text(field);
    let badge = (entity.badge_field == Some(field)).then(|| Badge {
        tone: BadgeTone::for_status(&text),
        label: text.clone(),
    });
    Cell { text, badge }
}

/// Action buttons offered for `record` from `origin`, after the entity's policy.
pub fn actions(entity: &EntityConfig, record: &Record, origin: ActionOrigin) -> Vec<ActionButton> {
    let Some(control) = &entity.status else {
        return Vec::new();
    };
    let current = record.text(control.field);
    let current = (!current.is_empty()).then_some(current.as_str());
    if !control.policy(origin).permits(current) {
        return Vec::new();
    }

    control
        .actions
        .iter()
        .map(|status| ActionButton {
            status: status.as_str(),
            label: status.action_label(),
            origin: origin.as_str(),
            class: match status {
                ReviewStatus::Approved => "btn btn-approve",
                ReviewStatus::Rejected => "btn btn-reject",
                ReviewStatus::Pending => "btn",
            },
        })
        .collect()
}

pub fn table(entity: &EntityConfig, records: &[Record]) -> TableView {
    let rows = records
        .iter()
        .map(|record| RowView {
            id: record.id.clone(),
            cells: entity
                .columns
                .iter()
                .map(|c| cell(entity, record, c.field))
                .collect(),
            actions: actions(entity, record, ActionOrigin::Inline),
        })
        .collect();

    TableView {
        headers: entity.columns.iter().map(|c| c.label).collect(),
        rows,
        has_actions: entity.is_mutable(),
    }
}

pub fn detail(entity: &EntityConfig, record: &Record) -> DetailView {
    DetailView {
        id: record.id.clone(),
        title: format!("{} Details", entity.title),
        fields: entity
            .detail_fields
            .iter()
            .map(|c| DetailField {
                label: c.label,
                cell: cell(entity, record, c.field),
            })
            .collect(),
        actions: actions(entity, record, ActionOrigin::Detail),
    }
}
