use pgvector::Vector;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Module {
    pub id: Uuid,
    pub name: String,
    pub label: Option<String>,
    pub description: Option<String>,
    pub auth_type: Option<String>,
    pub categories: Option<Vec<String>>,
    pub embedding: Option<Vector>,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ApiDoc {
    pub id: Uuid,
    pub module_id: Option<Uuid>,
    pub source_url: Option<String>,
    pub content: Option<String>,
    pub embedding: Vector,
    pub chunk_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewApiDoc {
    pub module_id: Uuid,
    pub source_url: Option<String>,
    pub content: String,
    pub embedding: Vector,
    pub chunk_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ModuleOverview {
    pub name: String,
    pub label: Option<String>,
    pub doc_count: i64,
    pub has_embedding: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogCounts {
    pub modules: i64,
    pub api_docs: i64,
    pub actions: i64,
    pub triggers: i64,
    pub connections: i64,
}

impl Module {
    #[inline]
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

impl ModuleOverview {
    #[inline]
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

impl CatalogCounts {
    #[inline]
    pub fn total(&self) -> i64 {
        self.modules + self.api_docs + self.actions + self.triggers + self.connections
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_display_label_fallback() {
        let module = Module {
            id: Uuid::new_v4(),
            name: "yandex_tracker".to_string(),
            label: None,
            description: None,
            auth_type: None,
            categories: None,
            embedding: None,
        };

        assert_eq!(module.display_label(), "yandex_tracker");

        let labeled = Module {
            label: Some("Yandex Tracker".to_string()),
            ..module
        };

        assert_eq!(labeled.display_label(), "Yandex Tracker");
    }

    #[test]
    fn overview_display_label_fallback() {
        let overview = ModuleOverview {
            name: "google_drive".to_string(),
            label: None,
            doc_count: 12,
            has_embedding: true,
        };

        assert_eq!(overview.display_label(), "google_drive");
    }

    #[test]
    fn catalog_counts_total() {
        let counts = CatalogCounts {
            modules: 2,
            api_docs: 10,
            actions: 1,
            triggers: 0,
            connections: 0,
        };

        assert_eq!(counts.total(), 13);
        assert!(!counts.is_empty());
        assert!(CatalogCounts::default().is_empty());
    }
}
