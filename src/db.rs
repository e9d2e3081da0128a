use crate::types::GdpRecord;
use anyhow::{Context, Result};
use mysql::prelude::Queryable;
use mysql::{Conn, OptsBuilder};

const STATUS_QUERY: &str = "SELECT 'Connection successful' AS status";

/// Per country, the row for the year in 2000-2024 with the largest absolute
/// real GDP change. Ranked rather than joined on the peak value, so a tied
/// absolute change (same |change| in two years, or a sign-flipped pair)
/// still yields exactly one row: rank 1 is the earliest tying year.
const GDP_QUERY: &str = "\
SELECT country, year, biggest_change
FROM (
    SELECT country, year, growth_rate AS biggest_change,
           ROW_NUMBER() OVER (
               PARTITION BY country
               ORDER BY ABS(growth_rate) DESC, year
           ) AS peak_rank
    FROM real_gdp_growth
    WHERE year BETWEEN 2000 AND 2024
) ranked
WHERE peak_rank = 1";

/// Open the database connection and run the one GDP query.
///
/// Credentials come from `MYSQL_USER`/`MYSQL_DATABASE` plus an interactive
/// password prompt; the host is fixed to localhost. A failed connection is
/// reported on stdout and returned as an error; nothing downstream can run
/// without this data.
pub fn load_gdp_records() -> Result<Vec<GdpRecord>> {
    let user = std::env::var("MYSQL_USER").context("MYSQL_USER is not set")?;
    let database = std::env::var("MYSQL_DATABASE").context("MYSQL_DATABASE is not set")?;
    let password = rpassword::prompt_password("MySQL password: ")
        .context("Failed to read password from terminal")?;

    let opts = OptsBuilder::new()
        .ip_or_hostname(Some("localhost"))
        .user(Some(user))
        .pass(Some(password))
        .db_name(Some(database));

    let mut conn = match Conn::new(opts) {
        Ok(conn) => conn,
        Err(e) => {
            println!("Connection failed: {e}");
            return Err(e).context("Could not connect to MySQL");
        }
    };

    let status: Option<String> = conn.query_first(STATUS_QUERY)?;
    println!("{}", status_line(status));

    let records = conn.query_map(
        GDP_QUERY,
        |(country, year, biggest_change): (String, i32, f64)| GdpRecord {
            country,
            year,
            biggest_change,
            standardized: String::new(),
        },
    )?;

    println!("Loaded GDP data for {} countries", records.len());
    Ok(records)
}

/// The printed status is the server's answer when there is one, and still a
/// readable success line if the status query comes back empty.
fn status_line(status: Option<String>) -> String {
    status.unwrap_or_else(|| "Connection successful".to_string())
}
