use anyhow::{anyhow, Context, Result};
use recipe_graph::cli::{parse_args, BrowseArgs, Command, DetailArgs};
use recipe_graph::client::detail::{assemble, rework, DetailEvent, Selection};
use recipe_graph::client::state::{list_view, BrowseAction, BrowseState};
use recipe_graph::client::{RecipeApi, RecipeCatalog};
use recipe_graph::completion::CompletionGateway;
use recipe_graph::config::ServerSettings;
use recipe_graph::server::{self, AppState};
use recipe_graph::store::StoreGateway;
use recipe_graph::telemetry;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = parse_args();
    telemetry::init(&cli.logging).context("Failed to install tracing subscriber")?;

    match cli.command {
        Command::Serve(settings) => serve(settings).await,
        Command::Browse(args) => browse(args).await,
        Command::Detail(args) => detail(args).await,
    }
}

/// Cancels the returned token on Ctrl-C.
fn cancel_on_interrupt() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received");
                trigger.cancel();
            }
            Err(err) => warn!(error = %err, "cannot listen for interrupts"),
        }
    });
    token
}

async fn serve(settings: ServerSettings) -> Result<()> {
    let state = AppState::new(
        StoreGateway::new(settings.store.store_url.clone()),
        CompletionGateway::new(settings.completion.provider()),
    );
    server::serve(settings.bind_addr, state, cancel_on_interrupt())
        .await
        .with_context(|| format!("Server on {} failed", settings.bind_addr))
}

async fn browse(args: BrowseArgs) -> Result<()> {
    let diet = args.diet_tag()?;
    let api = RecipeApi::new(&args.client.server_url)?;
    let mut catalog = RecipeCatalog::new();
    catalog
        .load_all(&api)
        .await
        .context("Failed to load the recipe catalog")?;
    if let Some(tag) = diet {
        catalog
            .load_by_diet(&api, tag)
            .await
            .with_context(|| format!("Failed to load {tag} recipes"))?;
    }

    let recipes = catalog.recipes();
    let mut state = BrowseState::new(args.client.page_size)
        .apply(BrowseAction::Diet(diet), recipes)
        .apply(BrowseAction::Search(args.search), recipes)
        .apply(BrowseAction::Region(args.region), recipes)
        .apply(BrowseAction::Category(args.category), recipes);
    state.page = args.page;

    let view = list_view(recipes, &state);
    println!(
        "{} recipes, page {}/{}",
        view.total_matches, view.page, view.total_pages
    );
    for recipe in &view.recipes {
        println!("  {:<40} {:<24} {:<16} [{}]", recipe.label, recipe.region, recipe.category, recipe.id);
    }
    println!("\nRegions:    {}", view.options.regions.join(", "));
    println!("Categories: {}", view.options.categories.join(", "));
    println!("Diets:      {}", view.options.diet_tags.join(", "));
    Ok(())
}

async fn detail(args: DetailArgs) -> Result<()> {
    let api = RecipeApi::new(&args.client.server_url)?;
    let mut catalog = RecipeCatalog::new();
    catalog
        .load_all(&api)
        .await
        .context("Failed to load the recipe catalog")?;
    let recipe = catalog
        .find(&args.recipe_id)
        .ok_or_else(|| anyhow!("No recipe with id '{}'", args.recipe_id))?
        .clone();

    let progress_callback = |event: &DetailEvent| match event {
        DetailEvent::Started { ingredients } => println!("Loading {ingredients} ingredients..."),
        DetailEvent::CardReady { ingredient } => println!("  ready: {ingredient}"),
        DetailEvent::LookupFailed { ingredient, lookup, error } => {
            println!("  {lookup} unavailable for {ingredient}: {error}")
        }
        DetailEvent::EstimateRequested => println!("Estimating one portion..."),
        DetailEvent::EstimateUnavailable => println!("No portion estimate."),
        DetailEvent::Cancelled => println!("Cancelled."),
        _ => {}
    };
    let view = assemble(&recipe, &api, cancel_on_interrupt(), progress_callback).await;

    println!("\n{}", view.label);
    if let Some(topic) = &view.topic {
        println!("Full recipe: {topic}");
    }
    for card in &view.cards {
        match card.nutrition.as_ref().and_then(|facts| facts.calories) {
            Some(kcal) => println!("- {} ({kcal} kcal/100 g)", card.name),
            None => println!("- {}", card.name),
        }
        for group in &card.alternatives {
            println!(
                "    {} {}: {}",
                group.relation.icon(),
                group.relation.label(),
                group.names.join(", ")
            );
        }
    }
    if let Some(estimate) = &view.estimate {
        println!("\nOne portion: {}", serde_json::to_string_pretty(estimate)?);
    }

    if !args.swaps.is_empty() {
        let mut selection = Selection::new();
        for (ingredient, alternative) in &args.swaps {
            selection.toggle(ingredient, alternative);
        }
        let text = rework(&recipe, &selection, &api)
            .await
            .context("Rework request failed")?;
        println!("\nReworked preparation:\n{text}");
    }
    Ok(())
}
