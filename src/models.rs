use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use uuid::Uuid;
use crate::services::table::{CellValue, ColumnType};

pub const SAMPLE_SIZE: usize = 5;

/// Statistics for one column. Built once by the profiler and never changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    pub dtype: ColumnType,
    pub null_count: usize,
    pub null_percentage: f64,
    pub unique_count: usize,
    pub sample_values: SmallVec<[CellValue; SAMPLE_SIZE]>,
}

/// Statistical summary of a whole table, handed to insight generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<ColumnProfile>,
}

impl Profile {
    pub fn new(row_count: usize, columns: Vec<ColumnProfile>) -> Self {
        Self {
            row_count,
            column_count: columns.len(),
            columns,
        }
    }
}

/// What an insight generator returns for a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightReport {
    pub insights: String,
    #[serde(default)]
    pub quality_score: Option<f64>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub id: Uuid,
    pub file_name: String,
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<ColumnProfile>,
    pub ai_insights: String,
    pub quality_score: Option<f64>,
    pub recommendations: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl AnalysisResponse {
    pub fn new(file_name: String, profile: Profile, report: InsightReport) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_name,
            row_count: profile.row_count,
            column_count: profile.column_count,
            columns: profile.columns,
            ai_insights: report.insights,
            quality_score: report.quality_score,
            recommendations: report.recommendations,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub environment: String,
}
