use crate::db::{CaseSensitivity, SortOrder};
use crate::models::ReviewStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub field: &'static str,
    pub label: &'static str,
}

impl Column {
    pub const fn new(field: &'static str, label: &'static str) -> Self {
        Self { field, label }
    }
}

/// What happens to the held records when a query fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    #[default]
    PreserveStale,
    Clear,
}

/// Which records a status action may be applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionPolicy {
    Disabled,
    /// Only records whose current status is `Pending`.
    PendingOnly,
    Unrestricted,
}

impl ActionPolicy {
    pub fn permits(&self, current: Option<&str>) -> bool {
        match self {
            ActionPolicy::Disabled => false,
            ActionPolicy::PendingOnly => {
                current.and_then(ReviewStatus::parse) == Some(ReviewStatus::Pending)
            }
            ActionPolicy::Unrestricted => true,
        }
    }
}

/// Where a status action was triggered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOrigin {
    Inline,
    Detail,
}

impl ActionOrigin {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "inline" => Some(ActionOrigin::Inline),
            "detail" => Some(ActionOrigin::Detail),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionOrigin::Inline => "inline",
            ActionOrigin::Detail => "detail",
        }
    }
}

/// The single mutable column of an entity and the actions offered on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusControl {
    pub field: &'static str,
    pub actions: Vec<ReviewStatus>,
    pub inline: ActionPolicy,
    pub detail: ActionPolicy,
}

impl StatusControl {
    pub fn policy(&self, origin: ActionOrigin) -> ActionPolicy {
        match origin {
            ActionOrigin::Inline => self.inline,
            ActionOrigin::Detail => self.detail,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportSource {
    /// The records currently held by the view.
    Filtered,
    /// A fresh, unfiltered fetch of the whole collection.
    FullRefetch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSpec {
    pub file_stem: &'static str,
    pub columns: Vec<Column>,
    pub source: ExportSource,
}

/// Everything the record browser needs to know about one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityConfig {
    pub key: &'static str,
    pub title: &'static str,
    pub collection: &'static str,
    pub columns: Vec<Column>,
    pub detail_fields: Vec<Column>,
    pub search_field: &'static str,
    pub case: CaseSensitivity,
    pub order: SortOrder,
    pub badge_field: Option<&'static str>,
    pub status: Option<StatusControl>,
    pub on_failure: FailurePolicy,
    pub export: ExportSpec,
}

impl EntityConfig {
    pub fn builder(key: &'static str, collection: &'static str) -> EntityConfigBuilder {
        EntityConfigBuilder::new(key, collection)
    }

    pub fn is_mutable(&self) -> bool {
        self.status.is_some()
    }
}

pub struct EntityConfigBuilder {
    key: &'static str,
    title: &'static str,
    collection: &'static str,
    columns: Vec<Column>,
    detail_fields: Vec<Column>,
    search_field: &'static str,
    case: CaseSensitivity,
    order_field: &'static str,
    badge_field: Option<&'static str>,
    status: Option<StatusControl>,
    on_failure: FailurePolicy,
    export_stem: Option<&'static str>,
    export_columns: Vec<Column>,
    export_source: ExportSource,
}

impl EntityConfigBuilder {
    fn new(key: &'static str, collection: &'static str) -> Self {
        Self {
            key,
            title: key,
            collection,
            columns: Vec::new(),
            detail_fields: Vec::new(),
            search_field: "name",
            case: CaseSensitivity::Insensitive,
            order_field: "created_at",
            badge_field: None,
            status: None,
            on_failure: FailurePolicy::PreserveStale,
            export_stem: None,
            export_columns: Vec::new(),
            export_source: ExportSource::Filtered,
        }
    }

    pub fn title(mut self, title: &'static str) -> Self {
        self.title = title;
        self
    }

    pub fn column(mut self, field: &'static str, label: &'static str) -> Self {
        self.columns.push(Column::new(field, label));
        self
    }

    pub fn detail(mut self, field: &'static str, label: &'static str) -> Self {
        self.detail_fields.push(Column::new(field, label));
        self
    }

    pub fn search(mut self, field: &'static str, case: CaseSensitivity) -> Self {
        self.search_field = field;
        self.case = case;
        self
    }

    pub fn newest_first_by(mut self, field: &'static str) -> Self {
        self.order_field = field;
        self
    }

    pub fn badge(mut self, field: &'static str) -> Self {
        self.badge_field = Some(field);
        self
    }

    pub fn status_actions(
        mut self,
        field: &'static str,
        actions: &[ReviewStatus],
        inline: ActionPolicy,
        detail: ActionPolicy,
    ) -> Self {
        self.status = Some(StatusControl {
            field,
            actions: actions.to_vec(),
            inline,
            detail,
        });
        self
    }

    pub fn on_failure(mut self, policy: FailurePolicy) -> Self {
        self.on_failure = policy;
        self
    }

    pub fn export_column(mut self, field: &'static str, label: &'static str) -> Self {
        self.export_columns.push(Column::new(field, label));
        self
    }

    pub fn export_as(mut self, file_stem: &'static str, source: ExportSource) -> Self {
        self.export_stem = Some(file_stem);
        self.export_source = source;
        self
    }

    pub fn build(self) -> Result<EntityConfig, String> {
        if self.columns.is_empty() {
            return Err(format!("Entity '{}' has no columns", self.key));
        }
        if self.search_field.is_empty() {
            return Err(format!("Entity '{}' has no search field", self.key));
        }
        if let Some(status) = &self.status {
            if status.actions.is_empty() {
                return Err(format!("Entity '{}' has a status field without actions", self.key));
            }
        }

        // Detail view and export fall back to the table columns.
        let detail_fields = if self.detail_fields.is_empty() {
            self.columns.clone()
        } else {
            self.detail_fields
        };
        let export_columns = if self.export_columns.is_empty() {
            self.columns.clone()
        } else {
            self.export_columns
        };

        Ok(EntityConfig {
            key: self.key,
            title: self.title,
            collection: self.collection,
            columns: self.columns,
            detail_fields,
            search_field: self.search_field,
            case: self.case,
            order: SortOrder::newest_first(self.order_field),
            badge_field: self.badge_field,
            status: self.status,
            on_failure: self.on_failure,
            export: ExportSpec {
                file_stem: self.export_stem.unwrap_or(self.key),
                columns: export_columns,
                source: self.export_source,
            },
        })
    }
}
