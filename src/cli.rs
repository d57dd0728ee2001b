use clap::{Args, Parser, Subcommand};

use crate::config::{ClientSettings, LoggingSettings, ServerSettings};
use crate::vocab::DietTag;

#[derive(Parser, Debug)]
#[command(author, version, about = "Browse a recipe knowledge graph", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub logging: LoggingSettings,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server in front of the graph store and the completion service
    Serve(ServerSettings),
    /// List one page of recipes from a running server
    Browse(BrowseArgs),
    /// Assemble the detail view of one recipe
    Detail(DetailArgs),
}

#[derive(Args, Debug)]
pub struct BrowseArgs {
    #[command(flatten)]
    pub client: ClientSettings,
    /// Case-insensitive substring of the recipe name
    #[arg(short, long, default_value = "")]
    pub search: String,
    #[arg(short, long, default_value = "")]
    pub region: String,
    #[arg(short, long, default_value = "")]
    pub category: String,
    /// glutenFree, lactoseFree, vegan or vegetarian
    #[arg(short, long)]
    pub diet: Option<String>,
    #[arg(short, long, default_value_t = 1)]
    pub page: usize,
}

#[derive(Args, Debug)]
pub struct DetailArgs {
    #[command(flatten)]
    pub client: ClientSettings,
    /// Recipe identifier as listed by `browse`
    pub recipe_id: String,
    /// Substitution for the rework step, as `ingredient=alternative`; repeatable
    #[arg(long = "swap", value_parser = parse_swap)]
    pub swaps: Vec<(String, String)>,
}

fn parse_swap(raw: &str) -> Result<(String, String), String> {
    let (ingredient, alternative) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ingredient=alternative, got '{raw}'"))?;
    let (ingredient, alternative) = (ingredient.trim(), alternative.trim());
    if ingredient.is_empty() || alternative.is_empty() {
        return Err(format!("expected ingredient=alternative, got '{raw}'"));
    }
    Ok((ingredient.to_string(), alternative.to_string()))
}

impl BrowseArgs {
    /// The requested diet, validated before anything is fetched.
    pub fn diet_tag(&self) -> crate::error::Result<Option<DietTag>> {
        self.diet.as_deref().map(str::parse::<DietTag>).transpose()
    }
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
