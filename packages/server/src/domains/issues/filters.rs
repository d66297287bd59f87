//! Filter and ordering parameters for issue listings.
//!
//! Filters are independently optional and conjunctive; free-text search ORs
//! across title/description/county/constituency/ward. `apply` pushes the
//! corresponding WHERE conditions onto a query builder so the SELECT and the
//! COUNT query stay in lockstep.

use anyhow::Result;
use chrono::NaiveDate;
use sqlx::{Postgres, QueryBuilder};

use crate::common::UserId;
use crate::domains::issues::models::{IssueCategory, IssueSeverity, IssueStatus};

#[derive(Debug, Clone, Default)]
pub struct IssueFilters {
    pub category: Option<IssueCategory>,
    pub severity: Option<IssueSeverity>,
    pub status: Option<IssueStatus>,
    pub county: Option<String>,
    pub constituency: Option<String>,
    pub ward: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub anonymous: Option<bool>,
    pub search: Option<String>,
    pub submitted_by: Option<UserId>,
}

impl IssueFilters {
    /// Push ` AND ...` conditions for every present filter. The base query
    /// must end in a WHERE clause (`WHERE 1=1`).
    pub fn apply(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        if let Some(category) = self.category {
            qb.push(" AND category = ").push_bind(category.to_string());
        }
        if let Some(severity) = self.severity {
            qb.push(" AND severity = ").push_bind(severity.to_string());
        }
        if let Some(status) = self.status {
            qb.push(" AND status = ").push_bind(status.to_string());
        }
        if let Some(county) = &self.county {
            qb.push(" AND county ILIKE ")
                .push_bind(format!("%{}%", county));
        }
        if let Some(constituency) = &self.constituency {
            qb.push(" AND constituency ILIKE ")
                .push_bind(format!("%{}%", constituency));
        }
        if let Some(ward) = &self.ward {
            qb.push(" AND ward ILIKE ").push_bind(format!("%{}%", ward));
        }
        if let Some(date_from) = self.date_from {
            qb.push(" AND created_at::date >= ").push_bind(date_from);
        }
        if let Some(date_to) = self.date_to {
            qb.push(" AND created_at::date <= ").push_bind(date_to);
        }
        if let Some(anonymous) = self.anonymous {
            qb.push(" AND anonymous = ").push_bind(anonymous);
        }
        if let Some(submitted_by) = self.submitted_by {
            qb.push(" AND submitted_by = ").push_bind(submitted_by);
        }
        if let Some(search) = &self.search {
            let pattern = format!("%{}%", search);
            qb.push(" AND (title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR description ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR county ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR constituency ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR ward ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
    }
}

/// Client-selectable ordering, `-` prefix for descending (`-created_at`,
/// `upvotes`, ...). Severity orders by rank, not alphabetically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssueOrdering {
    pub field: OrderField,
    pub descending: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
    CreatedAt,
    UpdatedAt,
    Upvotes,
    Severity,
}

impl Default for IssueOrdering {
    /// Newest first.
    fn default() -> Self {
        IssueOrdering {
            field: OrderField::CreatedAt,
            descending: true,
        }
    }
}

impl std::str::FromStr for IssueOrdering {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (name, descending) = match s.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (s, false),
        };
        let field = match name {
            "created_at" => OrderField::CreatedAt,
            "updated_at" => OrderField::UpdatedAt,
            "upvotes" => OrderField::Upvotes,
            "severity" => OrderField::Severity,
            _ => return Err(anyhow::anyhow!("Invalid ordering: {}", s)),
        };
        Ok(IssueOrdering { field, descending })
    }
}

impl IssueOrdering {
    /// The ORDER BY clause body. Only ever built from the whitelist above,
    /// never from raw client input.
    pub fn to_sql(self) -> String {
        let expr = match self.field {
            OrderField::CreatedAt => "created_at",
            OrderField::UpdatedAt => "updated_at",
            OrderField::Upvotes => "upvotes",
            OrderField::Severity => {
                "CASE severity WHEN 'low' THEN 0 WHEN 'medium' THEN 1 \
                 WHEN 'high' THEN 2 WHEN 'critical' THEN 3 END"
            }
        };
        let direction = if self.descending { "DESC" } else { "ASC" };
        format!("{} {}", expr, direction)
    }
}
