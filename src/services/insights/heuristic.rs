use futures::future::{self, BoxFuture, FutureExt};
use super::InsightGenerator;
use crate::error::AppError;
use crate::models::{InsightReport, Profile};

const MAX_RECOMMENDATIONS: usize = 5;
const HIGH_NULL_PERCENTAGE: f64 = 10.0;
const MODERATE_NULL_PERCENTAGE: f64 = 5.0;
const WIDE_TABLE_COLUMNS: usize = 10;

/// Offline generator that scores a profile from its null percentages.
/// Needs no network access, which makes it the default without an API key.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicInsightGenerator;

impl HeuristicInsightGenerator {
    pub fn report(&self, profile: &Profile) -> InsightReport {
        let avg_null_pct = if profile.columns.is_empty() {
            0.0
        } else {
            profile.columns.iter().map(|c| c.null_percentage).sum::<f64>()
                / profile.columns.len() as f64
        };
        let quality_score = (100.0 - avg_null_pct * 2.0).max(0.0);

        let mut insights = format!(
            "Your dataset contains {} rows and {} columns. ",
            profile.row_count, profile.column_count
        );
        if avg_null_pct > HIGH_NULL_PERCENTAGE {
            insights.push_str(&format!(
                "Data quality needs attention - average null rate is {:.1}%. ",
                avg_null_pct
            ));
        } else if avg_null_pct > MODERATE_NULL_PERCENTAGE {
            insights.push_str("Data quality is moderate with some missing values. ");
        } else {
            insights.push_str("Data quality is excellent with minimal missing values. ");
        }

        let mut recommendations: Vec<String> = profile
            .columns
            .iter()
            .filter(|c| c.null_percentage > HIGH_NULL_PERCENTAGE)
            .map(|c| {
                format!(
                    "Column '{}' has {:.1}% missing values - consider imputation or investigation",
                    c.name, c.null_percentage
                )
            })
            .collect();

        if recommendations.is_empty() {
            recommendations.push("Data appears clean - proceed with analysis".to_string());
            recommendations.push("Consider checking for outliers in numeric columns".to_string());
        }
        if profile.columns.len() > WIDE_TABLE_COLUMNS {
            recommendations.push("Large number of columns - consider dimensionality reduction".to_string());
        }
        recommendations.truncate(MAX_RECOMMENDATIONS);

        InsightReport {
            insights,
            quality_score: Some((quality_score * 10.0).round() / 10.0),
            recommendations,
        }
    }
}

impl InsightGenerator for HeuristicInsightGenerator {
    fn generate_insights<'a>(
        &'a self,
        profile: &'a Profile,
    ) -> BoxFuture<'a, Result<InsightReport, AppError>> {
        future::ready(Ok(self.report(profile))).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ColumnProfile;
    use crate::services::table::ColumnType;
    use smallvec::SmallVec;

    fn column(name: &str, null_percentage: f64) -> ColumnProfile {
        ColumnProfile {
            name: name.to_string(),
            dtype: ColumnType::Text,
            null_count: 0,
            null_percentage,
            unique_count: 0,
            sample_values: SmallVec::new(),
        }
    }

    #[test]
    fn clean_data_scores_high() {
        let profile = Profile::new(10, vec![column("a", 0.0), column("b", 2.0)]);
        let report = tokio_test::block_on(HeuristicInsightGenerator.generate_insights(&profile)).unwrap();

        assert_eq!(report.quality_score, Some(98.0));
        assert!(report.insights.contains("10 rows and 2 columns"));
        assert!(report.insights.contains("excellent"));
        assert_eq!(report.recommendations.len(), 2);
    }

    #[test]
    fn flags_columns_with_many_nulls() {
        let profile = Profile::new(3, vec![column("a", 33.33), column("b", 0.0)]);
        let report = HeuristicInsightGenerator.report(&profile);

        assert!(report.insights.contains("needs attention"));
        assert_eq!(report.recommendations.len(), 1);
        assert!(report.recommendations[0].contains("'a' has 33.3%"));
        assert_eq!(report.quality_score, Some(66.7));
    }

    #[test]
    fn score_never_goes_negative_and_recommendations_are_capped() {
        let columns = (0..12).map(|i| column(&format!("c{i}"), 100.0)).collect();
        let report = HeuristicInsightGenerator.report(&Profile::new(1, columns));

        assert_eq!(report.quality_score, Some(0.0));
        assert_eq!(report.recommendations.len(), MAX_RECOMMENDATIONS);
    }

    #[test]
    fn empty_profile_is_reported_as_clean() {
        let report = HeuristicInsightGenerator.report(&Profile::new(0, Vec::new()));
        assert_eq!(report.quality_score, Some(100.0));
    }
}
