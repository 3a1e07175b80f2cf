//! Step outcomes collected during a bootstrap run

use std::fmt;

use serde::Serialize;

/// What one bootstrap step did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Outcome {
    UserCreated { user: String },
    UserExists { user: String },
    UserDisabled,
    CollectionEnsured { collection: String, created: bool },
    AdminCreated { email: String },
    AdminSkipped { email: String },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserCreated { user } => write!(f, "Application user '{user}' created."),
            Self::UserExists { user } => {
                write!(f, "Application user '{user}' already exists, leaving it unchanged.")
            }
            Self::UserDisabled => write!(f, "Application user creation disabled, skipping."),
            Self::CollectionEnsured { collection, .. } => {
                write!(f, "Collection '{collection}' created or already exists.")
            }
            Self::AdminCreated { .. } => write!(f, "Default ADMIN user created."),
            Self::AdminSkipped { .. } => write!(f, "ADMIN user already exists, skipping creation."),
        }
    }
}

/// Ordered record of a bootstrap run against one database.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub database: String,
    pub outcomes: Vec<Outcome>,
}

impl Report {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            outcomes: Vec::new(),
        }
    }

    pub fn push(&mut self, outcome: Outcome) {
        self.outcomes.push(outcome);
    }

    /// Collections requested, in request order.
    pub fn collections(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                Outcome::CollectionEnsured { collection, .. } => Some(collection.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn admin_created(&self) -> bool {
        self.outcomes
            .iter()
            .any(|outcome| matches!(outcome, Outcome::AdminCreated { .. }))
    }

    pub fn admin_skipped(&self) -> bool {
        self.outcomes
            .iter()
            .any(|outcome| matches!(outcome, Outcome::AdminSkipped { .. }))
    }

    /// Human-readable status lines, one per step.
    pub fn lines(&self) -> Vec<String> {
        self.outcomes.iter().map(ToString::to_string).collect()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in &self.outcomes {
            writeln!(f, "{outcome}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_follow_step_order() {
        let mut report = Report::new("orioz-community");
        report.push(Outcome::UserCreated {
            user: "oriozapp".to_string(),
        });
        report.push(Outcome::CollectionEnsured {
            collection: "members".to_string(),
            created: true,
        });
        report.push(Outcome::AdminSkipped {
            email: "admin@orioz.org".to_string(),
        });

        assert_eq!(
            report.lines(),
            vec![
                "Application user 'oriozapp' created.",
                "Collection 'members' created or already exists.",
                "ADMIN user already exists, skipping creation.",
            ]
        );
        assert_eq!(report.collections(), vec!["members"]);
        assert!(report.admin_skipped());
        assert!(!report.admin_created());
    }

    #[test]
    fn existing_collection_reads_the_same_as_created() {
        let created = Outcome::CollectionEnsured {
            collection: "news".to_string(),
            created: true,
        };
        let existing = Outcome::CollectionEnsured {
            collection: "news".to_string(),
            created: false,
        };
        assert_eq!(created.to_string(), existing.to_string());
    }
}
