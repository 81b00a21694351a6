use crate::view_model::frame_image_url;
use crate::{AppState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::MediaPicked(path) => {
            state.clear_alert();
            let generation = state.pick_media(path.clone());
            vec![Effect::ProbeDuration { generation, path }]
        }
        Msg::MediaProbed { generation, result } => {
            state.apply_probe(generation, result);
            Vec::new()
        }
        Msg::TitleChanged(title) => {
            state.set_title(title);
            Vec::new()
        }
        Msg::UploadClicked => {
            state.clear_alert();
            match state.begin_upload() {
                Ok((job_id, media, title)) => vec![Effect::StartUpload {
                    job_id,
                    path: media.path().to_path_buf(),
                    title,
                }],
                Err(_) => Vec::new(),
            }
        }
        Msg::UploadProgress {
            job_id,
            loaded,
            total,
        } => {
            state.apply_upload_progress(job_id, loaded, total);
            Vec::new()
        }
        Msg::UploadDone { job_id, result } => {
            state.apply_upload_done(job_id, result);
            Vec::new()
        }
        Msg::QueryChanged(query) => {
            state.set_query(query);
            Vec::new()
        }
        Msg::SearchClicked => {
            state.clear_alert();
            match state.begin_search() {
                Ok((search_id, query)) => vec![Effect::Search { search_id, query }],
                Err(_) => Vec::new(),
            }
        }
        Msg::SearchDone { search_id, result } => {
            state.apply_search_done(search_id, result);
            Vec::new()
        }
        Msg::SaveFramesClicked { dir } => {
            state.clear_alert();
            match state.begin_frame_downloads() {
                Some((search_id, items)) => {
                    let service_url = state.service_url().to_string();
                    items
                        .into_iter()
                        .map(|(rank, frame)| Effect::SaveFrame {
                            search_id,
                            rank,
                            image_url: frame_image_url(&service_url, &frame),
                            frame,
                            dir: dir.clone(),
                        })
                        .collect()
                }
                None => {
                    state.alert_nothing_to_save();
                    Vec::new()
                }
            }
        }
        Msg::FrameSaved {
            search_id,
            rank,
            result,
        } => {
            state.apply_frame_saved(search_id, rank, result);
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
