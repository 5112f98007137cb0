mod config;

use std::{
    io::{self, BufRead, Write},
    process,
};

use quaver_core::{
    engine::DefaultMediaEngine,
    error::Error,
    input::TerminalInput,
    player::Player,
    resolver::HttpResolver,
    search::{HttpSearch, SearchService},
    session::SessionOrchestrator,
    store::PlaylistStore,
    track::Track,
};

use crate::config::Config;

fn main() {
    env_logger::init();

    if let Err(err) = run() {
        log::error!("fatal: {}", err);
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}

fn run() -> Result<(), Error> {
    let config = Config::load();
    config.save_if_missing();
    let proxy = Config::proxy();
    let api_base = config.api_base();
    log::info!("using api base {:?}", api_base);

    let search = HttpSearch::new(&api_base, proxy.as_deref());
    let resolver = HttpResolver::new(&api_base, proxy.as_deref());
    let engine = DefaultMediaEngine::open(proxy.as_deref())?;
    let player = Player::new(
        Box::new(resolver),
        Box::new(engine),
        Box::new(TerminalInput::new()),
    );
    let store = PlaylistStore::open(config.playlist_path());
    log::info!("playlist store at {:?}", store.path());
    let mut orchestrator = SessionOrchestrator::new(player, store);

    let stdin = io::stdin();
    let mut lines = stdin.lock();
    main_menu(&search, &mut orchestrator, &mut lines);
    Ok(())
}

fn main_menu(
    search: &dyn SearchService,
    orchestrator: &mut SessionOrchestrator,
    input: &mut dyn BufRead,
) {
    loop {
        println!("\n===== Quaver Music Player =====");
        println!("1. Search and play a song");
        println!("2. Manage playlists");
        println!("3. Exit");
        let Some(choice) = prompt(input, "Enter your choice: ") else {
            break;
        };
        match choice.as_str() {
            "1" => search_flow(search, orchestrator, input),
            "2" => manage_playlists(orchestrator, input),
            "3" => {
                println!("Goodbye!");
                break;
            }
            _ => println!("Invalid choice, please try again."),
        }
    }
}

fn search_flow(
    search: &dyn SearchService,
    orchestrator: &mut SessionOrchestrator,
    input: &mut dyn BufRead,
) {
    let Some(query) = prompt(input, "Enter song name to search: ") else {
        return;
    };
    if query.is_empty() {
        println!("Invalid input.");
        return;
    }
    println!("Searching for '{}'...", query);
    let candidates = match search.search(&query) {
        Ok(candidates) => candidates,
        Err(err) => {
            println!("Search failed: {}", err);
            return;
        }
    };
    if candidates.is_empty() {
        println!("No results found.");
        return;
    }
    for (position, track) in candidates.iter().enumerate() {
        println!("  {}. {} ({})", position + 1, track.title, track.duration);
    }

    let Some(choice) = prompt(input, "\nSelect a song number: ") else {
        return;
    };
    let Some(track) = choice
        .parse::<usize>()
        .ok()
        .and_then(|number| number.checked_sub(1))
        .and_then(|index| candidates.get(index))
    else {
        println!("Invalid selection.");
        return;
    };

    let Some(action) = prompt(input, "Play now or add to a playlist? (p/a): ") else {
        return;
    };
    match action.to_lowercase().as_str() {
        "p" => {
            let loop_track = matches!(
                prompt(input, "Loop this song? (y/n): ").as_deref(),
                Some("y") | Some("Y")
            );
            orchestrator.play_single(track, loop_track);
        }
        "a" => add_to_playlist(orchestrator, track.clone(), input),
        _ => println!("Invalid input."),
    }
}

fn add_to_playlist(
    orchestrator: &mut SessionOrchestrator,
    track: Track,
    input: &mut dyn BufRead,
) {
    let names = orchestrator.store().names();
    if !names.is_empty() {
        println!("\nExisting playlists:");
        for (position, name) in names.iter().enumerate() {
            println!("  {}. {}", position + 1, name);
        }
    }
    let Some(name) = prompt(input, "Enter a playlist name: ") else {
        return;
    };
    if name.is_empty() {
        println!("Invalid name.");
        return;
    }
    let title = track.title.clone();
    match orchestrator.add_track(&name, track) {
        Ok(size) => println!("Added '{}' to '{}' ({} songs).", title, name, size),
        Err(err) => println!("Could not save the playlist: {}", err),
    }
}

fn manage_playlists(orchestrator: &mut SessionOrchestrator, input: &mut dyn BufRead) {
    let names = orchestrator.store().names();
    if names.is_empty() {
        println!("No playlists yet. Add songs from the search menu first.");
        return;
    }
    println!("\n--- Your Playlists ---");
    for (position, name) in names.iter().enumerate() {
        let size = orchestrator.store().get(name).map_or(0, |tracks| tracks.len());
        println!("  {}. {} ({} songs)", position + 1, name, size);
    }
    let Some(choice) = prompt(input, "Select a playlist number: ") else {
        return;
    };
    let Some(name) = choice
        .parse::<usize>()
        .ok()
        .and_then(|number| number.checked_sub(1))
        .and_then(|index| names.get(index))
    else {
        println!("Invalid selection.");
        return;
    };
    manage_playlist(orchestrator, name, input);
}

fn manage_playlist(
    orchestrator: &mut SessionOrchestrator,
    name: &str,
    input: &mut dyn BufRead,
) {
    loop {
        println!("\n--- '{}' ---", name);
        println!("1. Play playlist");
        println!("2. Play playlist on loop");
        println!("3. Remove a song");
        println!("4. Back");
        let Some(action) = prompt(input, "Enter your choice: ") else {
            return;
        };
        match action.as_str() {
            "1" => {
                if let Err(err) = orchestrator.play_playlist(name, false) {
                    println!("{}", err);
                }
            }
            "2" => {
                if let Err(err) = orchestrator.play_playlist(name, true) {
                    println!("{}", err);
                }
            }
            "3" => remove_song(orchestrator, name, input),
            "4" => return,
            _ => println!("Invalid choice, please try again."),
        }
    }
}

fn remove_song(orchestrator: &mut SessionOrchestrator, name: &str, input: &mut dyn BufRead) {
    loop {
        let tracks = match orchestrator.store().get(name) {
            Some(tracks) => tracks.to_vec(),
            None => return,
        };
        if tracks.is_empty() {
            println!("This playlist is empty.");
            return;
        }
        println!("\n--- Songs in '{}' ---", name);
        for (position, track) in tracks.iter().enumerate() {
            println!("  {}. {}", position + 1, track.title);
        }
        let Some(choice) = prompt(input, "Enter a song number to remove, or 'b' to go back: ")
        else {
            return;
        };
        if choice.eq_ignore_ascii_case("b") {
            return;
        }
        match choice.parse::<usize>() {
            Ok(index) => match orchestrator.remove_track(name, index) {
                Ok(track) => println!("Removed '{}'.", track.title),
                Err(err) => println!("{}", err),
            },
            Err(_) => println!("Invalid number."),
        }
    }
}

fn prompt(input: &mut dyn BufRead, message: &str) -> Option<String> {
    print!("{}", message);
    let _ = io::stdout().flush();
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) => None,
        Ok(_) => Some(line.trim().to_string()),
        Err(err) => {
            log::warn!("failed to read input: {}", err);
            None
        }
    }
}
