use std::time::Instant;
use std::{env, process};

use aligntree::{random_alignment, GappedSegmentIter, RandomAlignmentParams};

use getopts::Options;

//-----------------------------------------------------------------------------

fn main() -> Result<(), String> {
    let start_time = Instant::now();

    // Parse arguments.
    let config = Config::new();

    // Generate the alignment.
    let alignment = random_alignment(&config.params)?;
    let root = alignment.root();
    eprintln!(
        "Generated an alignment with {} genomes; the root has {} segments",
        alignment.genome_count(), alignment.genome(root).bottom_count()
    );

    // Walk the gapped blocks of each child genome.
    for &child in alignment.genome(root).children() {
        let genome = alignment.genome(child);
        let count = genome.top_count();
        let mut blocks = 0;
        let mut aligned_blocks = 0;
        let mut gaps = 0;
        let mut gap_bases = 0;
        let mut largest = 0;

        let mut block = GappedSegmentIter::top(alignment.top_iter(child, 0), config.gap_threshold)?;
        loop {
            blocks += 1;
            if block.num_segments() > 1 || block.left().has_parent() {
                aligned_blocks += 1;
            }
            gaps += block.num_gaps();
            gap_bases += block.num_gap_bases();
            largest = largest.max(block.num_segments());
            if block.right().array_index() as usize == count - 1 {
                break;
            }
            block.to_right(None);
        }

        println!(
            "{}: {} segments in {} blocks ({} aligned); largest block {} segments; {} gaps of {} total bases",
            genome.name(), count, blocks, aligned_blocks, largest, gaps, gap_bases
        );
    }

    let end_time = Instant::now();
    let seconds = end_time.duration_since(start_time).as_secs_f64();
    eprintln!("Used {:.3} seconds", seconds);

    Ok(())
}

//-----------------------------------------------------------------------------

struct Config {
    pub params: RandomAlignmentParams,
    pub gap_threshold: usize,
}

impl Config {
    const DEFAULT_GAP_THRESHOLD: usize = 10;

    pub fn new() -> Config {
        let args: Vec<String> = env::args().collect();
        let program = args[0].clone();
        let defaults = RandomAlignmentParams::default();

        let mut opts = Options::new();
        opts.optflag("h", "help", "print this help");
        opts.optopt("s", "seed", "seed for the random number generator", "INT");
        opts.optopt("c", "children", &format!("number of child genomes (default: {})", defaults.children), "INT");
        opts.optopt("n", "segments", &format!("number of root segments (default: {})", defaults.segments), "INT");
        opts.optopt("l", "segment-length", &format!("mean segment length (default: {})", defaults.mean_segment_len), "INT");
        opts.optopt("g", "gap-probability", &format!("gap probability (default: {})", defaults.gap_probability), "FLOAT");
        opts.optopt("m", "max-gap", &format!("maximum gap length (default: {})", defaults.max_gap_len), "INT");
        opts.optopt("i", "inversion-probability", &format!("inversion probability (default: {})", defaults.inversion_probability), "FLOAT");
        opts.optopt("t", "threshold", &format!("gap threshold for merging blocks (default: {})", Self::DEFAULT_GAP_THRESHOLD), "INT");
        let matches = match opts.parse(&args[1..]) {
            Ok(m) => m,
            Err(f) => {
                eprintln!("{}", f);
                process::exit(1);
            }
        };

        if matches.opt_present("h") {
            let header = format!("Usage: {} [options]", program);
            eprint!("{}", opts.usage(&header));
            process::exit(0);
        }

        let mut params = defaults;
        if let Some(s) = matches.opt_str("s") {
            params.seed = Self::parse_number(&s, "--seed");
        }
        if let Some(s) = matches.opt_str("c") {
            params.children = Self::parse_number(&s, "--children");
        }
        if let Some(s) = matches.opt_str("n") {
            params.segments = Self::parse_number(&s, "--segments");
        }
        if let Some(s) = matches.opt_str("l") {
            params.mean_segment_len = Self::parse_number(&s, "--segment-length");
        }
        if let Some(s) = matches.opt_str("g") {
            params.gap_probability = Self::parse_number(&s, "--gap-probability");
        }
        if let Some(s) = matches.opt_str("m") {
            params.max_gap_len = Self::parse_number(&s, "--max-gap");
        }
        if let Some(s) = matches.opt_str("i") {
            params.inversion_probability = Self::parse_number(&s, "--inversion-probability");
        }
        let mut gap_threshold = Self::DEFAULT_GAP_THRESHOLD;
        if let Some(s) = matches.opt_str("t") {
            gap_threshold = Self::parse_number(&s, "--threshold");
        }

        Config { params, gap_threshold }
    }

    fn parse_number<T: std::str::FromStr>(value: &str, option: &str) -> T {
        value.parse::<T>().unwrap_or_else(|_| {
            eprintln!("Invalid value for {}: {}", option, value);
            process::exit(1);
        })
    }
}

//-----------------------------------------------------------------------------
