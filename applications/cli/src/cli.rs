/// Command-line definitions
use cadenza_core::types::Category;
use cadenza_library::{CategoryFilter, SortKey, SortOrder};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "cadenza")]
#[command(about = "Local media library and player", long_about = None)]
pub struct Cli {
    /// Configuration file path (defaults to ./cadenza.toml when present)
    #[arg(long, global = true, env = "CADENZA_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Add an audio file to the library
    Add {
        /// Audio file (mp3, wav, ogg, m4a)
        file: PathBuf,
        #[arg(short, long)]
        title: String,
        #[arg(short, long)]
        artist: String,
        #[arg(short, long)]
        category: Category,
        #[arg(short, long)]
        description: Option<String>,
        /// Cover image (jpeg, png, webp)
        #[arg(long)]
        cover: Option<PathBuf>,
        /// Accent color as #rrggbb
        #[arg(long)]
        color: Option<String>,
    },

    /// List tracks
    List {
        /// Category name or "all"
        #[arg(short, long, default_value = "all")]
        category: CategoryFilter,
        /// Case-insensitive text to match
        #[arg(short, long, default_value = "")]
        query: String,
        /// title, artist, addedDate, duration, plays or likes
        #[arg(short, long)]
        sort: Option<SortKey>,
        /// asc or desc
        #[arg(short, long)]
        order: Option<SortOrder>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show library statistics
    Stats {
        #[arg(long)]
        json: bool,
    },

    /// Edit track metadata
    Update {
        id: String,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        artist: Option<String>,
        #[arg(short, long)]
        category: Option<Category>,
        #[arg(short, long, conflicts_with = "clear_description")]
        description: Option<String>,
        #[arg(long)]
        clear_description: bool,
        #[arg(long, conflicts_with = "clear_cover")]
        cover: Option<PathBuf>,
        #[arg(long)]
        clear_cover: bool,
        #[arg(long)]
        color: Option<String>,
    },

    /// Delete tracks
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Like a track
    Like { id: String },

    /// Export the library as JSON
    Export {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import a JSON export
    Import { file: PathBuf },

    /// Manage playlists
    #[command(subcommand)]
    Playlist(PlaylistCommand),

    /// Inspect or drive the saved playback session
    #[command(subcommand)]
    Session(SessionCommand),
}

#[derive(Debug, Subcommand)]
pub enum PlaylistCommand {
    /// List playlists
    List,
    /// Create a playlist
    Create {
        name: String,
        #[arg(long)]
        public: bool,
    },
    /// Rename a playlist
    Rename { id: String, name: String },
    /// Append a track to a playlist
    Add { playlist: String, track: String },
    /// Remove a track from a playlist
    Remove { playlist: String, track: String },
    /// Delete a playlist
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
pub enum SessionCommand {
    /// Print the saved player state
    Show,
    /// Queue tracks and start playing
    Play {
        #[arg(required = true)]
        ids: Vec<String>,
        /// Queue position to start at
        #[arg(long, default_value_t = 0)]
        start: usize,
    },
    /// Skip to the next queued track
    Next,
    /// Go back (or restart the current track)
    Previous,
    /// Pause playback
    Pause,
    /// Set volume (0.0-1.0)
    Volume { level: f32 },
    /// Toggle mute
    Mute,
    /// Toggle shuffle
    Shuffle,
    /// Toggle repeat
    Repeat,
    /// Forget the saved player state
    Clear,
}
