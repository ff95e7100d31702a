mod contact;
mod health_check;
mod routing;
mod test_email;
