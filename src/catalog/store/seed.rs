//! Demo records served when no persistent store is configured.

use chrono::{DateTime, NaiveDate, Utc};

use crate::catalog::{thumbnail_url_for, watch_url_for, ExternalId, VideoRecord};

struct SeedVideo {
    id: &'static str,
    external_id: &'static str,
    title: &'static str,
    channel_name: &'static str,
    description: &'static str,
    tags: &'static [&'static str],
    published: (i32, u32, u32),
    created: (i32, u32, u32),
}

const SEED_VIDEOS: &[SeedVideo] = &[
    SeedVideo {
        id: "demo-1",
        external_id: "dQw4w9WgXcQ",
        title: "Rick Astley - Never Gonna Give You Up (Official Music Video)",
        channel_name: "Rick Astley",
        description: "The official video for a 1987 classic.",
        tags: &["Music", "Entertainment"],
        published: (2009, 10, 25),
        created: (2024, 3, 7),
    },
    SeedVideo {
        id: "demo-2",
        external_id: "9bZkp7q19f0",
        title: "PSY - GANGNAM STYLE M/V",
        channel_name: "officialpsy",
        description: "The music video that broke the view counter.",
        tags: &["Music", "K-Pop"],
        published: (2012, 7, 15),
        created: (2024, 3, 6),
    },
    SeedVideo {
        id: "demo-3",
        external_id: "UF8uR6Z6KLc",
        title: "Steve Jobs' 2005 Stanford Commencement Address",
        channel_name: "Stanford",
        description: "Three stories about connecting the dots, love and loss, and death.",
        tags: &["Interview", "Education"],
        published: (2008, 3, 7),
        created: (2024, 3, 5),
    },
    SeedVideo {
        id: "demo-4",
        external_id: "arj7oStGLkU",
        title: "Inside the mind of a master procrastinator",
        channel_name: "TED",
        description: "Tim Urban on the instant gratification monkey.",
        tags: &["Podcast", "Entertainment"],
        published: (2016, 4, 6),
        created: (2024, 3, 4),
    },
    SeedVideo {
        id: "demo-5",
        external_id: "aircAruvnKk",
        title: "But what is a neural network?",
        channel_name: "3Blue1Brown",
        description: "Chapter 1 of a visual introduction to deep learning.",
        tags: &["Documentaries", "Education"],
        published: (2017, 10, 5),
        created: (2024, 3, 3),
    },
    SeedVideo {
        id: "demo-6",
        external_id: "jNQXAC9IVRw",
        title: "Me at the zoo",
        channel_name: "jawed",
        description: "The first video ever uploaded to the platform.",
        tags: &["Documentaries"],
        published: (2005, 4, 24),
        created: (2024, 3, 2),
    },
    SeedVideo {
        id: "demo-7",
        external_id: "kJQP7kiw5Fk",
        title: "Luis Fonsi - Despacito ft. Daddy Yankee",
        channel_name: "LuisFonsiVEVO",
        description: "Official music video.",
        tags: &["Music", "News"],
        published: (2017, 1, 12),
        created: (2024, 3, 1),
    },
];

fn day((year, month, day): (i32, u32, u32)) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(12, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or_default()
}

/// The fixed demo catalog, newest first.
pub fn demo_records() -> Vec<VideoRecord> {
    SEED_VIDEOS
        .iter()
        .filter_map(|seed| {
            let external_id = ExternalId::parse(seed.external_id).ok()?;
            Some(VideoRecord {
                id: seed.id.to_string(),
                source_url: watch_url_for(&external_id),
                thumbnail_url: thumbnail_url_for(&external_id),
                external_id,
                title: seed.title.to_string(),
                channel_name: seed.channel_name.to_string(),
                description: seed.description.to_string(),
                published_at: day(seed.published),
                tags: seed.tags.iter().map(|t| t.to_string()).collect(),
                added_by_admin: true,
                created_at: day(seed.created),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn seven_valid_records_newest_first() {
        let records = demo_records();
        assert_eq!(records.len(), 7);

        let ids: HashSet<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), records.len());

        assert!(records
            .windows(2)
            .all(|pair| pair[0].created_at > pair[1].created_at));
    }
}
