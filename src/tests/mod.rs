mod api_webhook_router;
mod unit_config;
