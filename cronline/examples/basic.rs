//! Basic cronline API walkthrough: parse, next/last, match, display.

use cronline::CronSchedule;
use jiff::civil::DateTime;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse a cron line; names and shorthands are accepted
    let schedule: CronSchedule = "30 9 * * mon-fri".parse()?;
    println!("Parsed: {schedule}");

    // Next and previous occurrence
    let now: DateTime = "2025-06-15T08:00:00".parse()?;
    println!("Next after {now}: {}", schedule.next(now)?);
    println!("Last before {now}: {}", schedule.last(now)?);

    // The next 5 occurrences
    println!("\nNext 5 occurrences:");
    for dt in schedule.next_n(now, 5)? {
        println!("  {dt}");
    }

    // Check if a datetime matches the schedule
    let monday: DateTime = "2025-06-16T09:30:00".parse()?;
    println!("\n{monday} matches: {}", schedule.matches(monday)?);
    let sunday: DateTime = "2025-06-15T09:30:00".parse()?;
    println!("{sunday} matches: {}", schedule.matches(sunday)?);

    // Errors point at the offending field
    if let Err(e) = CronSchedule::parse("0 25 * * *") {
        println!("\n{}", e.display_rich());
    }

    // Display roundtrips through parsing
    let roundtripped: CronSchedule = schedule.to_string().parse()?;
    assert_eq!(schedule, roundtripped);
    println!("\nRoundtrip: {roundtripped}");

    Ok(())
}
