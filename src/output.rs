use console::Style;

use crate::mutants::Report;

pub fn print_error(msg: &str) {
    let style = Style::new().red().bold();
    eprintln!("{} {}", style.apply_to("✗"), msg);
}

pub fn print_success(msg: &str) {
    let style = Style::new().green().bold();
    println!("{} {}", style.apply_to("✓"), msg);
}

pub fn print_notice(msg: &str) {
    let dim = Style::new().dim();
    eprintln!("  {} {}", dim.apply_to("·"), msg);
}

pub fn print_report(report: &Report) {
    println!();
    if report.survived == 0 && report.uncovered == 0 {
        let style = Style::new().green().bold();
        println!(
            "{} {} mutations, all killed ({:.1}%)",
            style.apply_to("✓"),
            report.total,
            report.score(),
        );
    } else {
        let style = Style::new().yellow().bold();
        println!(
            "{} {} of {} mutations not killed ({:.1}% score)",
            style.apply_to("!"),
            report.survived + report.uncovered,
            report.total,
            report.score(),
        );
    }

    println!("Total:          {}", report.total);
    println!("Killed:         {}", report.killed);
    println!("Timeouts:       {}", report.timeouts);
    println!("Survived:       {}", report.survived);
    println!("Uncovered:      {}", report.uncovered);
    println!("Build failures: {}", report.build_failures);
    println!("Score:          {:.1}%", report.score());

    if !report.survivors.is_empty() {
        println!();
        for m in &report.survivors {
            let loc_style = Style::new().dim();
            let op_style = Style::new().magenta();
            println!(
                "  {}:{}:{} {} {} → {}",
                m.file.display(),
                m.line,
                m.column,
                loc_style.apply_to(format!("[{}]", m.operator)),
                op_style.apply_to(&m.original),
                op_style.apply_to(&m.replacement),
            );
        }
    }
}
