use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use std::io::{stdin, stdout, Write};
use std::path::PathBuf;

use connect4_engine::search::WIN_SCORE;
use connect4_engine::*;

mod display;

/// Who chooses the moves of a player
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Controller {
    /// the search engine
    Ai,
    /// uniformly random legal moves
    Random,
    /// moves typed on stdin
    Human,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Connect 4 against a search engine", long_about = None)]
struct Args {
    /// Controller of player 1 (X, moves first)
    #[arg(long, value_enum, default_value = "ai")]
    player_one: Controller,

    /// Controller of player 2 (O)
    #[arg(long, value_enum, default_value = "random")]
    player_two: Controller,

    /// Plies searched below each candidate move
    #[arg(long, default_value_t = SearchConfig::default().depth)]
    depth: u8,

    /// Random games per legal move at the search horizon
    #[arg(long, default_value_t = SearchConfig::default().playouts)]
    playouts: u32,

    /// Seed for the engine and the random player
    #[arg(long)]
    seed: Option<u64>,

    /// Table of precomputed position values, loaded at startup if it exists
    #[arg(long)]
    table: Option<PathBuf>,

    /// Write the table back on exit
    #[arg(long, requires = "table")]
    save: bool,

    /// Number of games to play without drawing the board
    #[arg(long, default_value_t = 1)]
    games: u32,

    /// Search candidate moves on all cores
    #[arg(long)]
    parallel: bool,

    /// Print the board as plain text
    #[arg(long)]
    plain: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

/// The search engine, single-threaded or sharing its table between threads
enum Engine {
    Serial(Searcher),
    Parallel(Searcher<SharedTranspositionTable>),
}

impl Engine {
    fn new(config: SearchConfig, table: TranspositionTable, seed: u64, parallel: bool) -> Self {
        if parallel {
            Engine::Parallel(Searcher::with_cache_and_seed(config, table.into(), seed))
        } else {
            Engine::Serial(Searcher::with_cache_and_seed(config, table, seed))
        }
    }

    fn best_move(&mut self, position: &Position) -> Option<Decision> {
        match self {
            Engine::Serial(searcher) => searcher.make_best_move(position),
            Engine::Parallel(searcher) => searcher.make_best_move_parallel(position),
        }
    }

    fn table(&self) -> TranspositionTable {
        match self {
            Engine::Serial(searcher) => searcher.cache().clone(),
            Engine::Parallel(searcher) => searcher.cache().to_table(),
        }
    }
}

/// What a human typed at the move prompt
enum Input {
    Column(usize),
    Undo,
    Quit,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, log_level),
    )
    .init();

    let config = SearchConfig {
        depth: args.depth,
        playouts: args.playouts,
    };

    // a table that fails to parse stops the program rather than seeding part of it
    let table = match &args.table {
        Some(path) if path.exists() => load_table(path)?,
        Some(path) => {
            info!("{} not found, starting with an empty table", path.display());
            TranspositionTable::new()
        }
        None => TranspositionTable::new(),
    };

    let mut rng = match args.seed {
        Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
        None => Xoshiro256PlusPlus::from_rng(&mut rand::rng()),
    };
    let mut engine = Engine::new(config, table, rng.random(), args.parallel);

    if args.games > 1 {
        play_batch(&args, &mut engine, &mut rng)?;
    } else {
        println!("Welcome to Connect 4\n");
        play_interactive(&args, &mut engine, &mut rng)?;
    }

    if args.save {
        if let Some(path) = &args.table {
            save_table(path, &engine.table())?;
        }
    }
    Ok(())
}

fn controller(args: &Args, player: Player) -> Controller {
    match player {
        Player::One => args.player_one,
        Player::Two => args.player_two,
    }
}

fn random_move(position: &Position, rng: &mut Xoshiro256PlusPlus) -> Position {
    let moves: Vec<Position> = position.list_moves().map(|(_, next)| next).collect();
    moves[rng.random_range(0..moves.len())]
}

fn play_batch(args: &Args, engine: &mut Engine, rng: &mut Xoshiro256PlusPlus) -> Result<()> {
    if args.player_one == Controller::Human || args.player_two == Controller::Human {
        bail!("human players can only play a single game");
    }

    let progress = ProgressBar::new(args.games as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("Playing games: {bar:40.cyan/blue} {pos}/{len} {msg} ~{eta} remaining")
            .progress_chars("█▓▒░  "),
    );

    // wins of player 1, wins of player 2, draws
    let mut results = (0u32, 0u32, 0u32);
    for _ in 0..args.games {
        let mut position = Position::new();
        while !position.is_terminal() {
            position = match controller(args, position.side_to_move()) {
                Controller::Ai => match engine.best_move(&position) {
                    Some(decision) => decision.position,
                    None => break,
                },
                _ => random_move(&position, rng),
            };
        }

        match position.outcome() {
            1 => results.0 += 1,
            -1 => results.1 += 1,
            _ => results.2 += 1,
        }
        debug!("final position:\n{}", position);
        progress.inc(1);
        progress.set_message(&format!(
            "(X {} / O {} / draw {})",
            results.0, results.1, results.2
        ));
    }
    progress.finish();

    println!(
        "Player 1 won {}, player 2 won {}, {} drawn",
        results.0, results.1, results.2
    );
    Ok(())
}

fn show(args: &Args, position: &Position) {
    if args.plain {
        display::print_plain(position);
    } else if let Err(err) = display::draw(position) {
        debug!("falling back to plain output: {}", err);
        display::print_plain(position);
    }
}

fn read_input() -> Result<Input> {
    let stdin = stdin();
    loop {
        print!("Move input (1-7, u to undo, q to quit) > ");
        stdout().flush().expect("Failed to flush to stdout!");

        let mut input_str = String::new();
        if stdin.read_line(&mut input_str)? == 0 {
            return Ok(Input::Quit);
        }
        match input_str.trim() {
            "u" => return Ok(Input::Undo),
            "q" => return Ok(Input::Quit),
            other => match other.parse::<usize>() {
                Ok(column @ 1..=WIDTH) => return Ok(Input::Column(column - 1)),
                Ok(column) => println!(
                    "Invalid move, column {} out of range. Columns must be between 1 and {}",
                    column, WIDTH
                ),
                Err(_) => println!("Invalid number: {}", other),
            },
        }
    }
}

fn describe(decision: &Decision, mover: Player) {
    if decision.score >= WIN_SCORE {
        println!("{} can force a win.", mover);
    } else if decision.score <= -WIN_SCORE {
        println!("{} can force a win.", mover.opponent());
    } else {
        let estimate = match decision.score {
            s if s > 0 => "favourable",
            0 => "balanced",
            _ => "unfavourable",
        };
        println!("Position looks {} for {}.", estimate, mover);
    }
}

fn play_interactive(args: &Args, engine: &mut Engine, rng: &mut Xoshiro256PlusPlus) -> Result<()> {
    // the driver owns the history for undo, positions never do
    let mut history = vec![Position::new()];

    // game loop
    loop {
        let position = match history.last() {
            Some(position) => *position,
            None => break,
        };
        show(args, &position);

        if position.is_terminal() {
            match position.winner() {
                Some(player) => println!("{} wins!", player),
                None => println!("Draw!"),
            }
            break;
        }

        let mover = position.side_to_move();
        let next = match controller(args, mover) {
            Controller::Ai => {
                println!("AI is thinking...");
                stdout().flush().expect("Failed to flush to stdout!");

                match engine.best_move(&position) {
                    Some(decision) => {
                        describe(&decision, mover);
                        println!("Best move: {}", decision.column + 1);
                        decision.position
                    }
                    None => break,
                }
            }
            Controller::Random => {
                let next = random_move(&position, rng);
                println!("{} plays at random", mover);
                next
            }
            Controller::Human => match read_input()? {
                Input::Column(column) => {
                    if !position.is_valid_move(column) {
                        println!("Invalid move, column {} full", column + 1);
                        continue;
                    }
                    position.apply_move(column)
                }
                Input::Undo => {
                    // step back to the previous position this human moved from
                    if history.len() > 1 {
                        history.pop();
                        while history.len() > 1
                            && controller(args, history[history.len() - 1].side_to_move())
                                != Controller::Human
                        {
                            history.pop();
                        }
                    } else {
                        println!("Nothing to undo");
                    }
                    continue;
                }
                Input::Quit => break,
            },
        };
        history.push(next);
    }
    Ok(())
}
