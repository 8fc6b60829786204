//! Prompt builders.

use chrono::NaiveDate;
use frigo_core::reports::{expiring_batches, low_stock, RouteStop};
use frigo_core::{Coordinates, Dataset, EXPIRY_WARNING_DAYS};
use serde_json::json;

/// Prompt for the inventory briefing.
///
/// Carries the raw products, batches and customers plus the two lists the
/// briefing must open with, already computed, so the model does not have
/// to do date arithmetic.
pub fn inventory_prompt(data: &Dataset, today: NaiveDate) -> String {
    let expiring: Vec<_> = expiring_batches(data, today, EXPIRY_WARNING_DAYS)
        .into_iter()
        .map(|b| {
            let product = data
                .product(&b.product_id)
                .map(|p| p.name.as_str())
                .unwrap_or(b.product_id.as_str());
            json!({
                "batchCode": b.batch_code,
                "product": product,
                "expiryDate": b.expiry_date,
                "currentQty": b.current_qty,
                "daysLeft": (b.expiry_date - today).num_days(),
            })
        })
        .collect();

    let low = low_stock(data);

    format!(
        "Analyze the following inventory and customer data for my frozen-food distribution business.\n\
         TODAY: {today}\n\
         PRODUCTS: {products}\n\
         BATCHES: {batches}\n\
         CUSTOMERS: {customers}\n\
         BATCHES EXPIRING WITHIN {days} DAYS: {expiring}\n\
         PRODUCTS BELOW MINIMUM STOCK: {low}\n\
         \n\
         Give an executive summary covering:\n\
         1. Critical batches about to expire (less than {days} days).\n\
         2. Products with stock below the minimum.\n\
         3. One strategic sales recommendation for today based on the batches expiring soon.",
        today = today,
        products = to_json(&data.products),
        batches = to_json(&data.batches),
        customers = to_json(&data.customers),
        days = EXPIRY_WARNING_DAYS,
        expiring = to_json(&expiring),
        low = to_json(&low),
    )
}

/// Prompt for the driver's route narrative.
///
/// Stops are numbered in the order given. Without an origin the route
/// starts at the distribution centre.
pub fn route_prompt(stops: &[RouteStop], origin: Option<Coordinates>) -> String {
    let stops_json: Vec<_> = stops
        .iter()
        .enumerate()
        .map(|(index, stop)| {
            json!({
                "id": index + 1,
                "name": stop.business_name,
                "address": stop.address,
                "lat": stop.coordinates.lat,
                "lng": stop.coordinates.lng,
            })
        })
        .collect();

    let start = match origin {
        Some(c) => format!("Driver's current position (lat {}, lng {}).", c.lat, c.lng),
        None => "Distribution centre (Barranquilla, downtown).".to_string(),
    };

    format!(
        "You are a logistics and GPS navigation expert for frozen-food delivery in Barranquilla.\n\
         \n\
         STARTING POINT: {start}\n\
         \n\
         CUSTOMERS TO VISIT:\n\
         {stops}\n\
         \n\
         TASK:\n\
         1. Give the EXACT delivery sequence (1, 2, 3...) minimising fuel and time.\n\
         2. Explain the navigation logic.\n\
         3. For each stop, mention one logistics detail (congestion, ease of unloading).\n\
         4. Estimate the total route time.\n\
         \n\
         Keep the tone professional and direct for a driver, written as a navigation log.",
        start = start,
        stops = to_json(&stops_json),
    )
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "[]".to_string())
}
