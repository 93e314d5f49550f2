use chrono::{DateTime, Utc};
use gallery::{init_logging, Gallery, GalleryConfig, GalleryState, StaticPicker};
use photo_gallery::{AlbumStore, PhotoToAdd};

/// `gallery [CONFIG] [PHOTO...]`: imports the given photos into the local
/// store and lists what it holds.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let mut args = std::env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| "gallery.toml".to_string());
    let config = GalleryConfig::load(&config_path)?;
    let gallery = Gallery::open(config)?;

    let imports: Vec<PhotoToAdd> = args
        .map(|path| {
            let date_taken = std::fs::metadata(&path)
                .and_then(|meta| meta.modified())
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            PhotoToAdd {
                origin_uri: path,
                date_taken,
            }
        })
        .collect();

    let state = GalleryState::new(gallery.local_store(), AlbumStore::default());
    let ticket = state.begin();
    let mut store = state.photos().refresh().await;
    if !imports.is_empty() {
        store = gallery
            .import_from_picker(&StaticPicker::new(imports), &store)
            .await?;
    }
    let state = state.apply(ticket, store);

    let ticket = state.begin_albums();
    let albums = gallery.refresh_albums(state.albums()).await;
    let state = state.apply_albums(ticket, albums);

    for photo in state.photos().photo_items() {
        println!("{}\t{}\t{}", photo.id, photo.date_taken.to_rfc3339(), photo.uri);
    }
    for album in state.albums().local_albums() {
        println!("album {}\t{} photos", album.name, album.photo_quantity);
    }
    log::info!(
        "{} photos, {} albums",
        state.photos().photo_items().len(),
        state.albums().local_albums().len()
    );

    Ok(())
}
