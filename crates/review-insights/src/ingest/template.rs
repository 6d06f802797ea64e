//! Downloadable CSV template and sample-data presets.

/// File name offered for the downloadable template.
pub const TEMPLATE_FILE_NAME: &str = "review_template_with_persona.csv";

/// A CSV template with a persona column and two example rows.
pub const CSV_TEMPLATE: &str = "Reviewer Name,Rating (1-5),Customer Type,Comment\n\
John Doe,5,Power User,\"I absolutely love these headphones! The noise cancelling is top-tier.\"\n\
Jane Smith,2,New User,\"Disappointed with the battery life. The setup was also confusing.\"\n";

/// Label of the generated sample source.
pub const SAMPLE_LABEL: &str = "Sample Headphones Data";

/// Product context attached to the generated sample source.
pub const SAMPLE_PRODUCT_CONTEXT: &str =
    "AcoustiMax Pro Headphones: Wireless, noise-cancelling, 20-hour battery life.";

/// Report date attached to the generated sample source.
pub const SAMPLE_REPORT_DATE: &str = "Q4 2024";

/// Segment column preset after generating sample data.
pub const SAMPLE_SEGMENT_COLUMN: &str = "Customer Type";
