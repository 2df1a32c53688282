// Video, analysis and report records served to the frontend.
//
// Nothing here is persisted or computed yet: the `sample_*` constructors
// produce the fixed data the endpoints return until an analysis pipeline
// exists.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

pub const SAMPLE_TITLE: &str = "Sample Video";
pub const SAMPLE_FILENAME: &str = "sample_video.mp4";

/// Timestamp format used in every response (`2024-01-01T12:00:00.000000Z`).
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoStatus {
    Pending,
    Processing,
    Completed,
}

#[derive(Debug, Clone, Serialize)]
pub struct Video {
    pub id: i64,
    pub title: String,
    pub filename: String,
    pub file_path: String,
    pub file_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    pub status: VideoStatus,
    pub uploaded_at: String,
}

impl Video {
    /// A freshly uploaded video awaiting analysis.
    pub fn pending_upload(title: String, filename: String, file_size: u64) -> Self {
        Video {
            id: 1,
            title,
            filename,
            file_path: "videos/temp.mp4".to_string(),
            file_size,
            duration: None,
            status: VideoStatus::Pending,
            uploaded_at: iso_timestamp(Utc::now()),
        }
    }
}

/// A video as shown on its detail page: the record plus its analysis, which
/// is `null` until the video has been processed.
#[derive(Debug, Clone, Serialize)]
pub struct VideoDetail {
    #[serde(flatten)]
    pub video: Video,
    pub analysis: Option<VideoAnalysis>,
}

impl VideoDetail {
    /// A completed video with its analysis attached.
    pub fn sample(id: i64) -> Self {
        let status = VideoStatus::Completed;
        let video = Video {
            id,
            title: SAMPLE_TITLE.to_string(),
            filename: SAMPLE_FILENAME.to_string(),
            file_path: "videos/sample.mp4".to_string(),
            file_size: 1_024_000,
            duration: Some(180),
            status,
            uploaded_at: iso_timestamp(Utc::now() - Duration::days(1)),
        };
        let analysis = (status == VideoStatus::Completed).then(|| VideoAnalysis::sample(id));
        VideoDetail { video, analysis }
    }
}

/// Reference to the analysed video inside a report.
#[derive(Debug, Clone, Serialize)]
pub struct VideoRef {
    pub id: i64,
    pub title: String,
    pub filename: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ElixirAnalysis {
    pub average_elixir: f64,
    pub elixir_efficiency: u32,
    pub peak_usage_times: Vec<Value>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CostAnalysis {
    pub deck_cost: f64,
    pub average_card_cost: f64,
    pub cost_distribution: Vec<Value>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimingAnalysis {
    pub attack_timings: Vec<Value>,
    pub defensive_timings: Vec<Value>,
    pub optimal_moments: Vec<Value>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskAnalysis {
    pub risk_factors: Vec<Value>,
    pub overall_risk_score: u32,
    pub recommendations: Vec<String>,
}

/// The four analysis sections shared by videos and reports.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSections {
    pub elixir_analysis: ElixirAnalysis,
    pub cost_analysis: CostAnalysis,
    pub timing_analysis: TimingAnalysis,
    pub risk_analysis: RiskAnalysis,
}

impl AnalysisSections {
    pub fn sample() -> Self {
        AnalysisSections {
            elixir_analysis: ElixirAnalysis {
                average_elixir: 7.5,
                elixir_efficiency: 75,
                peak_usage_times: Vec::new(),
                recommendations: Vec::new(),
            },
            cost_analysis: CostAnalysis {
                deck_cost: 3.8,
                average_card_cost: 3.8,
                cost_distribution: Vec::new(),
                recommendations: Vec::new(),
            },
            timing_analysis: TimingAnalysis {
                attack_timings: Vec::new(),
                defensive_timings: Vec::new(),
                optimal_moments: Vec::new(),
                recommendations: Vec::new(),
            },
            risk_analysis: RiskAnalysis {
                risk_factors: Vec::new(),
                overall_risk_score: 65,
                recommendations: Vec::new(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VideoAnalysis {
    pub id: i64,
    pub video_id: i64,
    #[serde(flatten)]
    pub sections: AnalysisSections,
    pub created_at: String,
    pub updated_at: String,
}

impl VideoAnalysis {
    pub fn sample(video_id: i64) -> Self {
        let now = iso_timestamp(Utc::now());
        VideoAnalysis {
            id: 1,
            video_id,
            sections: AnalysisSections::sample(),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub id: i64,
    pub video_id: i64,
    pub video: VideoRef,
    pub summary: String,
    pub generated_at: String,
    pub analysis: AnalysisSections,
}

impl Report {
    pub fn sample(video_id: i64) -> Self {
        Report {
            id: 1,
            video_id,
            video: VideoRef {
                id: video_id,
                title: SAMPLE_TITLE.to_string(),
                filename: SAMPLE_FILENAME.to_string(),
            },
            summary: "This is a sample report summary.".to_string(),
            generated_at: iso_timestamp(Utc::now()),
            analysis: AnalysisSections::sample(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardStats {
    pub total_videos: u64,
    pub total_reports: u64,
    pub processing_videos: u64,
    pub recent_videos: Vec<Video>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_iso_timestamp_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 8, 5, 1).unwrap();
        assert_eq!(iso_timestamp(at), "2024-03-09T08:05:01.000000Z");
    }

    #[test]
    fn test_pending_upload_shape() {
        let video = Video::pending_upload("My run".into(), "run.webm".into(), 2048);
        let value = serde_json::to_value(&video).unwrap();
        assert_eq!(value["status"], "pending");
        assert_eq!(value["file_path"], "videos/temp.mp4");
        assert_eq!(value["file_size"], 2048);
        assert!(value.get("duration").is_none());
        assert!(value.get("analysis").is_none());
    }

    #[test]
    fn test_sample_video_carries_analysis() {
        let value = serde_json::to_value(VideoDetail::sample(12)).unwrap();
        assert_eq!(value["id"], 12);
        assert_eq!(value["status"], "completed");
        assert_eq!(value["duration"], 180);
        assert_eq!(value["analysis"]["video_id"], 12);
        assert_eq!(value["analysis"]["elixir_analysis"]["average_elixir"], 7.5);
        assert_eq!(value["analysis"]["risk_analysis"]["overall_risk_score"], 65);
        assert_eq!(value["analysis"]["timing_analysis"]["attack_timings"], json!([]));
    }

    #[test]
    fn test_sample_report_echoes_video_id() {
        let value = serde_json::to_value(Report::sample(5)).unwrap();
        assert_eq!(value["video_id"], 5);
        assert_eq!(value["video"]["id"], 5);
        assert_eq!(value["analysis"]["cost_analysis"]["deck_cost"], 3.8);
    }

    #[test]
    fn test_dashboard_stats_zeroed() {
        let value = serde_json::to_value(DashboardStats::default()).unwrap();
        assert_eq!(
            value,
            json!({
                "total_videos": 0,
                "total_reports": 0,
                "processing_videos": 0,
                "recent_videos": []
            })
        );
    }
}
