/*****************************************************************************************[main.rs]
Copyright (c) 2003-2006, Niklas Een, Niklas Sorensson (MiniSat)
Copyright (c) 2007-2010, Niklas Sorensson (MiniSat)
Copyright (c) 2018-2018, Masaki Hara

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and
associated documentation files (the "Software"), to deal in the Software without restriction,
including without limitation the rights to use, copy, modify, merge, publish, distribute,
sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or
substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT
NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT
OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
**************************************************************************************************/

#[cfg(feature = "logging")]
#[macro_use]
extern crate log;

use {
    clap::{App, Arg, ArgMatches},
    flate2::bufread::GzDecoder,
    gbcsat::{
        gbc::{AlphaOrder, ProbeOrder, Shrink},
        lbool, BasicSolver, Discovery, GbcOpts, ProbePlan, Recorder, Solver, SolverInterface,
        SolverOpts,
    },
    std::{
        fs::File,
        io::{self, BufRead, BufReader, BufWriter, Write},
        mem,
        process::exit,
        str::FromStr,
        time::Instant,
    },
};

mod system;

#[cfg(not(feature = "logging"))]
macro_rules! debug {
    ($( $x:expr ),*) => {};
}

fn main() {
    #[cfg(feature = "logging")]
    env_logger::init();
    let exitcode = main2().unwrap_or_else(|err| {
        eprintln!("{}", err);
        exit(1)
    });
    exit(exitcode);
}

fn parse_arg<T: FromStr>(matches: &ArgMatches, name: &str, default: T) -> T {
    matches
        .value_of(name)
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Like `parse_arg`, but a value that does not parse is an error.
fn parse_choice<T>(matches: &ArgMatches, name: &str, default: T) -> io::Result<T>
where
    T: FromStr<Err = String>,
{
    match matches.value_of(name) {
        None => Ok(default),
        Some(s) => s
            .parse()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, format!("ERROR! {}", e))),
    }
}

fn main2() -> io::Result<i32> {
    let resource = system::ResourceMeasure::new();

    let matches = App::new("gbcsat")
        .version("0.1.0")
        .about("CDCL SAT solver with globally blocked clause discovery")
        .arg(Arg::with_name("input-file"))
        .arg(Arg::with_name("result-output-file"))
        .arg(Arg::with_name("proof").long("proof").help("produce proof in DRAT/PR on stdout"))
        .arg(
            Arg::with_name("verbosity")
                .long("verb")
                .default_value("1")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("cpu-lim")
                .long("cpu-lim")
                .default_value("-1.0")
                .takes_value(true),
        )
        .arg(Arg::with_name("is-strict").long("strict"))
        .arg(Arg::with_name("var-decay").long("var-decay")
             .help("The variable activity decay factor")
             .default_value("0.95")
             .takes_value(true))
        .arg(Arg::with_name("clause-decay").long("cla-decay")
             .help("The clause activity decay factor")
             .default_value("0.999")
             .takes_value(true))
        .arg(Arg::with_name("random-var-freq").long("rnd-freq")
             .help("The frequency with which the decision heuristic tries to choose a random variable")
             .default_value("0.0")
             .takes_value(true))
        .arg(Arg::with_name("random-seed").long("rnd-seed")
             .help("Used by the random variable selection")
             .default_value("91648253.0")
             .takes_value(true))
        .arg(Arg::with_name("ccmin-mode").long("ccmin-mode")
             .help("Controls conflict clause minimization (0=none, 1=basic, 2=deep)")
             .default_value("2")
             .takes_value(true))
        .arg(Arg::with_name("phase-saving").long("phase-saving")
             .help("Controls the level of phase saving (0=none, 1=limited, 2=full)")
             .default_value("2")
             .takes_value(true))
        .arg(Arg::with_name("rnd-init").long("rnd-init")
             .conflicts_with("no-rnd-init")
             .help("Randomize the initial activity"))
        .arg(Arg::with_name("no-rnd-init").long("no-rnd-init")
             .help("Do not randomize the initial activity [default]"))
        .arg(Arg::with_name("luby-restart").long("luby")
             .conflicts_with("no-luby-restart")
             .help("Use the Luby restart sequence [default]"))
        .arg(Arg::with_name("no-luby-restart").long("no-luby")
             .help("Do not use the Luby restart sequence"))
        .arg(Arg::with_name("restart-first").long("rfirst")
             .help("The base restart interval")
             .default_value("100")
             .takes_value(true))
        .arg(Arg::with_name("restart-inc").long("rinc")
             .help("Restart interval increase factor")
             .default_value("2.0")
             .takes_value(true))
        .arg(Arg::with_name("garbage-frac").long("gc-frac")
             .help("The fraction of wasted memory allowed before a garbage collection is triggered")
             .default_value("0.20")
             .takes_value(true))
        .arg(Arg::with_name("min-learnts-lim").long("min-learnts")
             .help("Minimum learnt clause limit")
             .default_value("0")
             .takes_value(true))
        // globally blocked clauses
        .arg(Arg::with_name("global").long("global")
             .help("Search for globally blocked clauses before solving"))
        .arg(Arg::with_name("global-order").long("global-order")
             .help("Probe order (index, freq, random, plan)")
             .takes_value(true))
        .arg(Arg::with_name("global-plan").long("global-plan")
             .help("Probe plan file; implies --global-order plan")
             .takes_value(true))
        .arg(Arg::with_name("global-shrink").long("global-shrink")
             .help("Shrink strategy (prop, binary, greedy, replay)")
             .takes_value(true))
        .arg(Arg::with_name("global-alpha-order").long("global-alpha-order")
             .help("Order of assumption literals before shrinking (none, implication, random)")
             .takes_value(true))
        .arg(Arg::with_name("global-no-filter").long("global-no-filter")
             .help("Keep clauses that are implied by propagation"))
        .arg(Arg::with_name("global-max-len").long("global-max-len")
             .help("Longest clause kept by the filter")
             .default_value("16")
             .takes_value(true))
        .arg(Arg::with_name("global-max-clause").long("global-max-clause")
             .help("Clauses tried per episode when shrinking finds nothing")
             .default_value("5")
             .takes_value(true))
        .arg(Arg::with_name("global-time-lim").long("global-time-lim")
             .help("Time budget of the search, in seconds")
             .default_value("30")
             .takes_value(true))
        .arg(Arg::with_name("global-seed").long("global-seed")
             .help("Random seed [default: clock]")
             .takes_value(true))
        .arg(Arg::with_name("global-no-touch").long("global-no-touch")
             .help("Pair each probe with every variable, not only touched literals"))
        .arg(Arg::with_name("global-both-pol").long("global-both-pol")
             .help("Pair each probe with both polarities of touched literals"))
        .arg(Arg::with_name("global-no-shrink").long("global-no-shrink")
             .help("Do not shrink the assumption side"))
        .arg(Arg::with_name("global-no-learn").long("global-no-learn")
             .help("Only record found clauses, do not add them"))
        .arg(Arg::with_name("global-keep-decisions").long("global-keep-decisions")
             .help("Allow decisions on the assumption side"))
        .arg(Arg::with_name("global-retries").long("global-retries")
             .help("Conflict analyses per shrink step before giving up")
             .default_value("1")
             .takes_value(true))
        .arg(Arg::with_name("global-record").long("global-record")
             .help("Write found clauses to FILE and FILE_pr")
             .takes_value(true))
        .get_matches();

    let mut solver_opts = SolverOpts::default();
    solver_opts.var_decay = parse_arg(&matches, "var-decay", solver_opts.var_decay);
    solver_opts.clause_decay = parse_arg(&matches, "clause-decay", solver_opts.clause_decay);
    solver_opts.random_var_freq =
        parse_arg(&matches, "random-var-freq", solver_opts.random_var_freq);
    solver_opts.random_seed = parse_arg(&matches, "random-seed", solver_opts.random_seed);
    solver_opts.ccmin_mode = parse_arg(&matches, "ccmin-mode", solver_opts.ccmin_mode);
    solver_opts.phase_saving = parse_arg(&matches, "phase-saving", solver_opts.phase_saving);
    solver_opts.rnd_init_act = matches.is_present("rnd-init");
    solver_opts.luby_restart = !matches.is_present("no-luby-restart");
    solver_opts.restart_first = parse_arg(&matches, "restart-first", solver_opts.restart_first);
    solver_opts.restart_inc = parse_arg(&matches, "restart-inc", solver_opts.restart_inc);
    solver_opts.garbage_frac = parse_arg(&matches, "garbage-frac", solver_opts.garbage_frac);
    solver_opts.min_learnts_lim =
        parse_arg(&matches, "min-learnts-lim", solver_opts.min_learnts_lim);
    let produce_proof = matches.is_present("proof");
    solver_opts.produce_proof = produce_proof;

    if !solver_opts.check() {
        eprintln!("Invalid option value");
        exit(1);
    }

    let gbc_opts = gbc_opts(&matches)?;
    if !gbc_opts.check() {
        eprintln!("Invalid option value for the global clause search");
        exit(1);
    }

    let input_file = matches.value_of("input-file");
    let result_output_file = matches.value_of("result-output-file");
    let verbosity: i32 = parse_arg(&matches, "verbosity", 0);
    if verbosity < 0 || verbosity > 2 {
        eprintln!(
            "ERROR! value <{}> is too small for option \"verb\".",
            verbosity
        );
        exit(1);
    }
    let is_strict = matches.is_present("is-strict");
    let cpu_lim = matches
        .value_of("cpu-lim")
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|x| *x > 0.);

    let mut solver: BasicSolver = Solver::new(solver_opts, Default::default());
    solver.cb_mut().set_verbose(verbosity > 1);

    // setup timeout handler, if any
    if let Some(max_cpu) = cpu_lim {
        let r = system::ResourceMeasure::new();
        solver.cb_mut().set_stop(move || r.cpu_time() > max_cpu);
    }

    let initial_time = Instant::now();

    if let Some(input_file) = input_file {
        debug!("solve file {}", input_file);
        let file = BufReader::new(File::open(input_file)?);
        read_input_autogz(file, &mut solver, is_strict, verbosity)?;
    } else {
        println!("c Reading from standard input... Use '--help' for help.");
        let stdin = io::stdin();
        read_input_autogz(stdin.lock(), &mut solver, is_strict, verbosity)?;
    }

    let mut resfile = if let Some(result_output_file) = result_output_file {
        Some(BufWriter::new(File::create(result_output_file)?))
    } else {
        None
    };

    if verbosity > 0 {
        println!(
            "c |  Number of variables:  {:12}                                         |",
            solver.num_vars()
        );
        println!(
            "c |  Number of clauses:    {:12}                                         |",
            solver.num_clauses()
        );
        let duration = Instant::now() - initial_time;
        println!(
            "c |  Parse time:           {:9}.{:02} s                                       |",
            duration.as_secs(),
            duration.subsec_nanos() / 10_000_000
        );
        println!("c |                                                                             |");
    }

    let mut ret = if solver.simplify() {
        lbool::UNDEF
    } else {
        if verbosity > 0 {
            println!(
                "c ==============================================================================="
            );
            println!("c Solved by unit propagation");
        }
        lbool::FALSE
    };

    if ret == lbool::UNDEF && gbc_opts.enabled {
        ret = run_discovery(&mut solver, gbc_opts, &matches, verbosity, &resource)?;
    }
    if ret == lbool::UNDEF {
        ret = solver.solve_limited();
    }

    if verbosity > 0 {
        solver.print_stats();
        println!("c CPU time              : {:.3}s", resource.cpu_time());
    }
    if ret == lbool::TRUE {
        println!("s SATISFIABLE");

        // print model
        if produce_proof && resfile.is_none() {
            println!("{}", solver.dimacs_model());
        }
    } else if ret == lbool::FALSE {
        println!("s UNSATISFIABLE");

        if let (Some(proof), None) = (solver.proof(), resfile.as_ref()) {
            print!("{}", proof);
        }
    } else {
        println!("s INDETERMINATE");
    }
    if let Some(resfile) = resfile.as_mut() {
        if ret == lbool::TRUE {
            writeln!(resfile, "s SAT")?;
            writeln!(resfile, "{}", solver.dimacs_model())?;
        } else if ret == lbool::FALSE {
            writeln!(resfile, "s UNSAT")?;
            if let Some(proof) = solver.proof() {
                write!(resfile, "{}", proof)?;
            }
        } else {
            writeln!(resfile, "s INDET")?;
        }
        resfile.flush()?;
    }
    mem::drop(resfile);

    let exitcode = if ret == lbool::TRUE {
        10
    } else if ret == lbool::FALSE {
        20
    } else {
        0
    };

    if !cfg!(debug_assertions) {
        // (faster than "return", which will invoke the destructor for 'Solver')
        exit(exitcode);
    }

    Ok(exitcode)
}

fn gbc_opts(matches: &ArgMatches) -> io::Result<GbcOpts> {
    let mut opts = GbcOpts::default();
    opts.enabled = matches.is_present("global");
    opts.order = parse_choice(matches, "global-order", ProbeOrder::Index)?;
    if matches.is_present("global-plan") {
        opts.order = ProbeOrder::Plan;
    }
    opts.shrink = parse_choice(matches, "global-shrink", Shrink::Propagate)?;
    opts.alpha_order = parse_choice(matches, "global-alpha-order", AlphaOrder::Identity)?;
    opts.filter_trivial = !matches.is_present("global-no-filter");
    opts.max_len = parse_arg(matches, "global-max-len", opts.max_len);
    opts.max_fallback = parse_arg(matches, "global-max-clause", opts.max_fallback);
    opts.time_limit = parse_arg(matches, "global-time-lim", opts.time_limit);
    opts.seed = matches.value_of("global-seed").and_then(|s| s.parse().ok());
    opts.touch = !matches.is_present("global-no-touch");
    opts.both_polarities = matches.is_present("global-both-pol");
    opts.no_shrink = matches.is_present("global-no-shrink");
    opts.learn = !matches.is_present("global-no-learn");
    opts.skip_decisions = !matches.is_present("global-keep-decisions");
    opts.shrink_retries = parse_arg(matches, "global-retries", opts.shrink_retries);
    Ok(opts)
}

fn run_discovery(
    solver: &mut BasicSolver,
    opts: GbcOpts,
    matches: &ArgMatches,
    verbosity: i32,
    resource: &system::ResourceMeasure,
) -> io::Result<lbool> {
    let plan = match matches.value_of("global-plan") {
        Some(path) => Some(ProbePlan::parse(&mut BufReader::new(File::open(path)?))?),
        None => None,
    };
    let start = resource.wall_time();
    let order = opts.order;

    let mut discovery = Discovery::new(solver, opts);
    if let Some(base) = matches.value_of("global-record") {
        discovery = discovery.with_recorder(Recorder::create(base)?);
    }
    let ret = discovery.run(plan.as_ref())?;
    let stats = discovery.finish()?;

    if verbosity > 0 {
        println!("c ============================[ Global Clauses ]================================");
        println!("c gbc order             : {}", order);
        stats.print();
        println!(
            "c gbc time              : {:.3}s",
            resource.wall_time() - start
        );
    }
    if ret == lbool::FALSE && verbosity > 0 {
        println!("c Solved by global clause search");
    }
    Ok(ret)
}

fn read_input_autogz<R: BufRead>(
    mut input: R,
    solver: &mut BasicSolver,
    is_strict: bool,
    verbosity: i32,
) -> io::Result<()> {
    let is_gz = input.fill_buf()?.starts_with(b"\x1F\x8B");
    if is_gz {
        read_input(
            BufReader::new(GzDecoder::new(input)),
            solver,
            is_strict,
            verbosity,
        )
    } else {
        read_input(input, solver, is_strict, verbosity)
    }
}

fn read_input<R: BufRead>(
    mut input: R,
    solver: &mut BasicSolver,
    is_strict: bool,
    verbosity: i32,
) -> io::Result<()> {
    if verbosity > 0 {
        println!("c ============================[ Problem Statistics ]=============================");
        println!("c |                                                                             |");
    }
    gbcsat::dimacs::parse(&mut input, solver, is_strict)?;
    Ok(())
}
