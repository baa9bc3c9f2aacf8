pub mod insights;
pub mod profiler;
pub mod table;

use crate::error::ProfileError;
use crate::models::Profile;
use profiler::ProfileComputer;
use table::TableLoader;

/// Loads `data` according to the extension of `file_name` and profiles it.
pub fn profile_file(data: &[u8], file_name: &str) -> Result<Profile, ProfileError> {
    let start = std::time::Instant::now();

    let table = TableLoader::new().load(data, file_name)?;
    tracing::info!(
        "Loaded {} in {:?}: {} rows, {} columns",
        file_name,
        start.elapsed(),
        table.row_count(),
        table.column_count()
    );

    let profile_start = std::time::Instant::now();
    let profile = ProfileComputer::new().compute(&table);
    tracing::info!("Profiled {} in {:?}", file_name, profile_start.elapsed());

    Ok(profile)
}
