mod csv;
mod files;
mod format;
mod status;
mod summary;

pub(crate) use csv::output_session_csv;
pub(crate) use files::{output_file_detail_json, output_files_json, print_file_detail, print_file_table};
pub(crate) use status::{StatusInfo, output_status_json, print_status_table};
pub(crate) use summary::{output_summary_json, print_summary_table, summarize};
