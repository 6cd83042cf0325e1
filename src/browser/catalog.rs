use std::collections::HashMap;
use std::sync::Arc;

use super::entity::{ActionPolicy, EntityConfig, ExportSource};
use crate::db::CaseSensitivity;
use crate::models::ReviewStatus;

/// The entities exposed by the admin, in dashboard order.
pub struct Catalog {
    entities: Vec<Arc<EntityConfig>>,
    by_key: HashMap<&'static str, usize>,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            by_key: HashMap::new(),
        }
    }

    /// Register an entity. A later entity with the same key replaces the
    /// earlier one in place.
    pub fn register(&mut self, entity: EntityConfig) {
        let key = entity.key;
        let entity = Arc::new(entity);
        match self.by_key.get(key) {
            Some(&idx) => self.entities[idx] = entity,
            None => {
                self.by_key.insert(key, self.entities.len());
                self.entities.push(entity);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Arc<EntityConfig>> {
        self.by_key.get(key).map(|&idx| &self.entities[idx])
    }

    pub fn list(&self) -> &[Arc<EntityConfig>] {
        &self.entities
    }

    pub fn collections(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entities.iter().map(|e| e.collection)
    }

    /// Contacts, donors, event registrations and volunteer applications.
    pub fn standard() -> Result<Self, String> {
        let mut catalog = Catalog::new();
        catalog.register(contacts()?);
        catalog.register(donors()?);
        catalog.register(event_registrations()?);
        catalog.register(volunteers()?);
        Ok(catalog)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

pub fn contacts() -> Result<EntityConfig, String> {
    EntityConfig::builder("contacts", "contact_submissions")
        .title("Contact Submissions")
        .column("name", "Name")
        .column("email", "Email")
        .column("subject", "Subject")
        .column("created_at", "Date")
        .column("status", "Status")
        .search("name", CaseSensitivity::Insensitive)
        .newest_first_by("created_at")
        .build()
}

pub fn donors() -> Result<EntityConfig, String> {
    EntityConfig::builder("donors", "donors")
        .title("Donors")
        .column("name", "Name")
        .column("email", "Email")
        .column("phone", "Phone")
        .column("amount", "Amount")
        .column("program", "Program")
        .column("date", "Date")
        .column("status", "Status")
        .search("name", CaseSensitivity::Insensitive)
        .newest_first_by("created_at")
        .build()
}

pub fn event_registrations() -> Result<EntityConfig, String> {
    EntityConfig::builder("events", "event_registrations")
        .title("Event Registrations")
        .column("name", "Name")
        .column("email", "Email")
        .column("event", "Event")
        .column("attendee_type", "Type")
        .column("registration_date", "Date")
        .column("status", "Status")
        .detail("name", "Name")
        .detail("email", "Email")
        .detail("phone", "Phone")
        .detail("attendee_type", "Attendee Type")
        .detail("event", "Event")
        .detail("registration_date", "Registration Date")
        .detail("special_requirements", "Special Requirements")
        .detail("status", "Status")
        .search("name", CaseSensitivity::Insensitive)
        .newest_first_by("registration_date")
        .badge("status")
        .export_column("name", "Name")
        .export_column("email", "Email")
        .export_column("phone", "Phone")
        .export_column("event", "Event")
        .export_column("registration_date", "Registration Date")
        .export_column("attendee_type", "Attendee Type")
        .export_column("special_requirements", "Special Requirements")
        .export_column("status", "Status")
        .export_as("event-registrations", ExportSource::FullRefetch)
        .build()
}

pub fn volunteers() -> Result<EntityConfig, String> {
    EntityConfig::builder("volunteers", "volunteer_applications")
        .title("Volunteer Applications")
        .column("name", "Name")
        .column("email", "Email")
        .column("skills", "Skills")
        .column("availability", "Availability")
        .column("date", "Date")
        .column("status", "Status")
        .detail("name", "Name")
        .detail("email", "Email")
        .detail("phone", "Phone")
        .detail("availability", "Availability")
        .detail("skills", "Skills")
        .detail("experience", "Experience")
        .detail("motivation", "Motivation")
        .detail("status", "Status")
        .search("name", CaseSensitivity::Insensitive)
        .newest_first_by("date")
        .badge("status")
        .status_actions(
            "status",
            &[ReviewStatus::Approved, ReviewStatus::Rejected],
            ActionPolicy::PendingOnly,
            ActionPolicy::Unrestricted,
        )
        .export_column("name", "Name")
        .export_column("email", "Email")
        .export_column("phone", "Phone")
        .export_column("skills", "Skills")
        .export_column("availability", "Availability")
        .export_column("experience", "Experience")
        .export_column("date", "Date")
        .export_column("status", "Status")
        .export_as("volunteers", ExportSource::Filtered)
        .build()
}
