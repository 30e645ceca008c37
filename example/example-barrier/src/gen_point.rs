use rlink_barrier::api::element::{Element, Point};
use rlink_barrier::api::group::{GroupInfo, Tags};
use rlink_barrier::utils::date_time::current_timestamp_millis;

pub fn host_group(host: &str) -> GroupInfo {
    let mut tags = Tags::new();
    tags.insert("host".to_string(), host.to_string());
    GroupInfo::new(tags)
}

pub fn create_point(host: &str, value: f64) -> Element {
    let point = Point::new("cpu", host_group(host), current_timestamp_millis())
        .with_field("usage_idle", value);
    Element::new_point(point)
}
