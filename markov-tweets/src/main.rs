//! Corpus-driven tweet generator.
//!
//! Learns word-to-word transition frequencies from a whitespace-tokenized
//! text corpus, then prints weighted random word sequences. A word whose
//! last character is `.` closes its sentence: it can end a tweet but is
//! never a transition source.

use std::fmt;
use std::fs;
use std::num::{NonZeroU32, NonZeroUsize};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use log::debug;
use markov_core::model::chain::{Chain, StateId};
use markov_core::model::error::ChainError;
use markov_core::model::payload::Payload;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Maximum number of words in one generated tweet.
const MAX_TWEET_WORDS: usize = 20;

const NUM_ARGS_ERROR: &str = "Usage: invalid number of arguments";
const FILE_PATH_ERROR: &str = "Error: incorrect file path";

/// Generate pseudo-random tweets from a text corpus.
#[derive(Parser, Debug)]
#[command(name = "markov-tweets", about = "Generate pseudo-random tweets from a text corpus.")]
struct Args {
    /// RNG seed; the same seed and corpus reproduce the same tweets.
    seed: u32,
    /// Number of tweets to generate.
    num_tweets: NonZeroU32,
    /// Path to the corpus file.
    corpus: PathBuf,
    /// Read at most this many words from the corpus.
    words_to_read: Option<NonZeroUsize>,
}

/// A single corpus token.
#[derive(Clone, PartialEq, Eq, Debug)]
struct Word(String);

impl Word {
    fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Payload for Word {
    /// A word ending in `.` must close its sentence.
    fn is_terminal(&self) -> bool {
        self.0.ends_with('.')
    }
}

/// Feeds the corpus into the chain.
///
/// Tokenizes by runs of ASCII whitespace (space, tab, CR, LF), interns
/// each word, and observes `previous -> current` for consecutive words
/// of the same sentence. A terminal word resets the previous-word
/// pointer so no transition ever leaves it. Stops after `limit` words
/// when a limit is given.
fn fill_chain(chain: &mut Chain<Word>, text: &str, limit: Option<usize>) -> Result<(), ChainError> {
    let mut previous: Option<StateId> = None;
    let mut words_read = 0usize;

    for token in text.split_ascii_whitespace() {
        if limit.is_some_and(|limit| words_read >= limit) {
            break;
        }

        let word = Word(token.to_owned());
        let current = chain.intern(&word)?;
        words_read += 1;

        if let Some(previous) = previous {
            chain.observe(previous, current)?;
        }
        previous = if word.is_terminal() { None } else { Some(current) };
    }

    debug!("read {words_read} words, {} distinct", chain.len());
    Ok(())
}

/// Renders a walk as space-separated words, no trailing separator.
fn render_tweet(chain: &Chain<Word>, walk: &[StateId]) -> String {
    walk.iter()
        .map(|&id| chain[id].as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

fn main() -> ExitCode {
    env_logger::init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    let _ = err.print();
                    ExitCode::SUCCESS
                }
                ErrorKind::MissingRequiredArgument | ErrorKind::UnknownArgument => {
                    eprintln!("{NUM_ARGS_ERROR}");
                    ExitCode::FAILURE
                }
                _ => {
                    let _ = err.print();
                    ExitCode::FAILURE
                }
            };
        }
    };

    let text = match fs::read_to_string(&args.corpus) {
        Ok(text) => text,
        Err(err) => {
            debug!("cannot read {}: {err}", args.corpus.display());
            eprintln!("{FILE_PATH_ERROR}");
            return ExitCode::FAILURE;
        }
    };

    let mut chain = Chain::new();
    if let Err(err) = fill_chain(&mut chain, &text, args.words_to_read.map(NonZeroUsize::get)) {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }

    let mut rng = ChaCha8Rng::seed_from_u64(args.seed.into());
    for i in 1..=args.num_tweets.get() {
        let Some(start) = chain.random_start(&mut rng) else {
            eprintln!("Error: corpus contains no usable starting word");
            return ExitCode::FAILURE;
        };
        let walk = chain.generate(start, MAX_TWEET_WORDS, &mut rng);
        println!("Tweet {i}: {}", render_tweet(&chain, &walk));
    }

    ExitCode::SUCCESS
}
