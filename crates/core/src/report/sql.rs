//! SQL report renderer.

use chrono::{DateTime, Utc};
use std::fmt::Write;

use super::types::{RenderedReport, ReportData};

/// Detail rows per INSERT statement.
pub const DETAIL_BATCH_SIZE: usize = 100;

const SUMMARY_DDL: &str = "\
CREATE TABLE IF NOT EXISTS performance_test_summary (
  test_performed_time DATETIME PRIMARY KEY,
  action_url VARCHAR(1024) NOT NULL,
  number_of_competitors INT NOT NULL,
  request_frequency INT NOT NULL,
  total_requests INT NOT NULL,
  successful_requests INT NOT NULL,
  unfinished_requests INT NOT NULL,
  failed_requests INT NOT NULL,
  sql_matrix_duration INT NOT NULL,
  test_duration FLOAT NOT NULL
);
";

const DETAILS_DDL: &str = "\
CREATE TABLE IF NOT EXISTS performance_test_details (
  id INT AUTO_INCREMENT PRIMARY KEY,
  test_performed_time DATETIME NOT NULL,
  request_item_id VARCHAR(255) NOT NULL,
  competitor_name VARCHAR(255) NOT NULL,
  execution_duration FLOAT,
  status ENUM('passed', 'failed', 'unfinished') NOT NULL,
  FOREIGN KEY (test_performed_time) REFERENCES performance_test_summary(test_performed_time)
);
";

const DETAILS_INSERT_HEAD: &str = "\
INSERT INTO performance_test_details
  (test_performed_time, request_item_id, competitor_name, execution_duration, status)
VALUES
";

/// Escape backslashes and single quotes for a MySQL string literal.
fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

pub fn render_sql(data: &ReportData, generated_at: DateTime<Utc>) -> RenderedReport {
    let timestamp = data.start_time.format("%Y-%m-%d %H:%M:%S").to_string();
    let mut out = String::new();

    let _ = writeln!(out, "-- Rate of Fire Performance Test SQL Report");
    let _ = writeln!(
        out,
        "-- Generated: {}\n",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    let _ = writeln!(out, "-- Test Summary Table");
    let _ = writeln!(out, "{}", SUMMARY_DDL);
    let _ = writeln!(out, "-- Request Details Table");
    let _ = writeln!(out, "{}", DETAILS_DDL);

    let _ = writeln!(out, "-- Insert test summary data");
    let _ = writeln!(out, "INSERT INTO performance_test_summary VALUES (");
    let _ = writeln!(out, "  '{}',", timestamp);
    let _ = writeln!(out, "  '{}',", escape(&data.action_url));
    let _ = writeln!(out, "  {},", data.competitor_count);
    let _ = writeln!(out, "  {},", data.requests_per_minute);
    let _ = writeln!(out, "  {},", data.overall.total);
    let _ = writeln!(out, "  {},", data.overall.passed);
    let _ = writeln!(out, "  {},", data.overall.running);
    let _ = writeln!(out, "  {},", data.overall.failed);
    let _ = writeln!(out, "  {},", data.matrix_duration_secs);
    let _ = writeln!(out, "  {:.2}", data.test_duration_secs);
    let _ = writeln!(out, ");\n");

    let _ = writeln!(
        out,
        "-- Insert request details data (limited to first {} seconds)",
        data.matrix_duration_secs
    );
    out.push_str(&render_details(data, &timestamp));

    RenderedReport {
        filename: super::report_filename("rate-of-fire-sql", "sql", generated_at),
        content_type: "text/plain",
        content: out,
    }
}

fn render_details(data: &ReportData, timestamp: &str) -> String {
    if data.details.is_empty() {
        return "-- No request details data available within the specified duration\n".to_string();
    }

    let statements: Vec<String> = data
        .details
        .chunks(DETAIL_BATCH_SIZE)
        .map(|batch| {
            let rows: Vec<String> = batch
                .iter()
                .map(|record| {
                    let duration = match record.duration_seconds {
                        Some(secs) => format!("{:.4}", secs),
                        None => "NULL".to_string(),
                    };
                    format!(
                        "  ('{}', '{}', '{}', {}, '{}')",
                        timestamp,
                        escape(&record.item_id),
                        escape(&record.competitor),
                        duration,
                        record.status.as_str()
                    )
                })
                .collect();
            format!("{}{}", DETAILS_INSERT_HEAD, rows.join(",\n"))
        })
        .collect();

    format!("{};\n", statements.join(";\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{DetailRecord, DetailStatus};
    use crate::testing::fixtures;

    fn detail(i: usize) -> DetailRecord {
        DetailRecord {
            competitor: "Andy".to_string(),
            item_id: format!("item-{}", i),
            status: DetailStatus::Passed,
            duration_seconds: Some(0.125),
            request_time: None,
        }
    }

    #[test]
    fn test_summary_insert() {
        let report = render_sql(&fixtures::report_data(), fixtures::epoch());

        assert_eq!(report.filename, "rate-of-fire-sql-2024-01-01-00-00.sql");
        let sql = &report.content;
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS performance_test_summary ("));
        assert!(sql.contains("  test_performed_time DATETIME PRIMARY KEY,\n"));
        assert!(sql.contains("INSERT INTO performance_test_summary VALUES (\n  '2024-01-01 00:00:00',\n"));
        assert!(sql.contains("  10.00\n);\n"));
        assert!(sql.contains("-- No request details data available within the specified duration\n"));
    }

    #[test]
    fn test_details_batched_by_hundred() {
        let mut data = fixtures::report_data();
        data.details = (0..250).map(detail).collect();

        let sql = render_sql(&data, fixtures::epoch()).content;

        assert_eq!(sql.matches("INSERT INTO performance_test_details").count(), 3);
        assert!(sql.contains("  ('2024-01-01 00:00:00', 'item-0', 'Andy', 0.1250, 'passed'),\n"));
        assert!(sql.ends_with("'item-249', 'Andy', 0.1250, 'passed');\n"));
    }

    #[test]
    fn test_quotes_escaped_and_null_duration() {
        let mut data = fixtures::report_data();
        data.action_url = "http://x/it's/{id}".to_string();
        data.details = vec![DetailRecord {
            competitor: "Andy".to_string(),
            item_id: "o'neil".to_string(),
            status: DetailStatus::Unfinished,
            duration_seconds: None,
            request_time: None,
        }];

        let sql = render_sql(&data, fixtures::epoch()).content;

        assert!(sql.contains("  'http://x/it\\'s/{id}',\n"));
        assert!(sql.contains("  ('2024-01-01 00:00:00', 'o\\'neil', 'Andy', NULL, 'unfinished');\n"));
    }

    #[test]
    fn test_trailing_backslash_stays_inside_literal() {
        let mut data = fixtures::report_data();
        data.details = vec![DetailRecord {
            competitor: "Bob\\".to_string(),
            item_id: "a\\'b".to_string(),
            status: DetailStatus::Failed,
            duration_seconds: Some(0.5),
            request_time: None,
        }];

        let sql = render_sql(&data, fixtures::epoch()).content;

        assert!(sql.contains("'a\\\\\\'b', 'Bob\\\\', 0.5000, 'failed');\n"));
    }
}
