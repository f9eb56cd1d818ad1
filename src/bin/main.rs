#[macro_use]
extern crate log;

use std::io::{self, BufRead, BufWriter, Write};

use clap::Parser;
use pathmatch::prelude::*;

#[derive(Parser)]
#[command(
    name = "pathmatch",
    about = "Rank candidates read from stdin against a fuzzy query",
    version
)]
struct Args {
    /// Query to match candidates against
    #[arg(short, long, default_value = "")]
    query: String,
    /// Currently open file, biases ranking toward its neighbors
    #[arg(long, default_value = "")]
    crfile: String,
    /// Maximum number of matches to print (0 = unlimited)
    #[arg(short, long, default_value_t = 10)]
    limit: usize,
    /// Number of matcher threads
    #[arg(short = 'j', long, default_value_t = 1)]
    threads: usize,
    /// Decode candidates as UTF-8 instead of raw bytes
    #[arg(long)]
    unicode: bool,
    /// Treat candidates as opaque strings instead of paths
    #[arg(long)]
    no_path: bool,
    /// Per-component matching discipline
    #[arg(long, value_enum, default_value = "auto")]
    path_mode: QueryPathMode,
    /// Part of each line the matcher sees
    #[arg(long, value_enum, default_value = "full-line")]
    key_mode: KeyMode,
    /// Print score details and match positions for every match
    #[arg(long)]
    match_info: bool,
    /// Also print Vim highlight regexes in the given grouping mode
    #[arg(long, value_enum, default_value = "none")]
    highlight: HighlightMode,
}

fn main() {
    env_logger::init();

    match real_main() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            // A closed downstream pipe is a normal way for a pager to stop
            // reading; exit quietly.
            if err.kind() == io::ErrorKind::BrokenPipe {
                std::process::exit(0);
            }
            eprintln!("pathmatch: {err}");
            std::process::exit(2);
        }
    }
}

fn real_main() -> io::Result<i32> {
    let args = Args::parse();

    let want_info = args.match_info || args.highlight != HighlightMode::None;
    let opts = MatchOptionsBuilder::default()
        .crfile(args.crfile.clone().into_bytes())
        .limit(args.limit)
        .nr_threads(args.threads.max(1))
        .path(!args.no_path)
        .query_path_mode(args.path_mode)
        .unicode(args.unicode)
        .want_match_info(want_info)
        .build()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

    let items: Vec<LineItem> = io::stdin()
        .lock()
        .split(b'\n')
        .map(|line| line.map(|l| LineItem::new(l, args.key_mode)))
        .collect::<Result<_, _>>()?;
    debug!("read {} candidate(s) from stdin", items.len());

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut write_error: Option<io::Error> = None;

    for_each_match(
        args.query.as_bytes(),
        &opts,
        IterSource::new(items.into_iter()),
        |item: LineItem, info| {
            if write_error.is_some() {
                return;
            }
            if let Err(e) = write_match(&mut out, &args, &item, info.as_ref()) {
                write_error = Some(e);
            }
        },
    )
    .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    if let Some(e) = write_error {
        return Err(e);
    }
    out.flush()?;
    Ok(0)
}

fn write_match(out: &mut impl Write, args: &Args, item: &LineItem, info: Option<&MatchInfo>) -> io::Result<()> {
    out.write_all(item.line())?;
    out.write_all(b"\n")?;
    let Some(info) = info else {
        return Ok(());
    };
    // Positions come back relative to the match key; shift them onto the
    // full line before showing them.
    let positions: Vec<usize> = info.match_positions().iter().map(|p| p + item.key_offset()).collect();
    if args.match_info {
        writeln!(out, "- score: {}; {}", info.score(), info.score_debug_string())?;
        let rendered = positions.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(", ");
        writeln!(out, "- match positions: {rendered}")?;
    }
    if args.highlight != HighlightMode::None {
        for regex in highlight_regexes(args.highlight, item.line(), &positions, b"") {
            out.write_all(b"- highlight: ")?;
            out.write_all(&regex)?;
            out.write_all(b"\n")?;
        }
    }
    Ok(())
}
