//! Seed the database with demo customers, addresses, deliverers and deliveries.
//!
//! Every record goes through the same validation and services as the API, so
//! the principal-address and address-ownership rules hold for seeded data.
//! Seeding is skipped when the first demo customer is already registered.

use chrono::{Days, NaiveDate, TimeDelta, Utc};
use perim_core::{DeliveryStatus, ExtraVolumes, TaxId};
use secrecy::SecretString;
use tracing::info;

use perim_server::db::{self, AddressRepository, CustomerRepository, DelivererRepository};
use perim_server::models::{
    AddressWrite, CreateAddressRequest, CreateCustomerRequest, CreateDeliveryRequest,
};
use perim_server::services::{CustomerService, DeliveryService};

struct DemoAddress {
    postal_code: &'static str,
    street: &'static str,
    number: &'static str,
    neighborhood: &'static str,
    principal: bool,
}

struct DemoCustomer {
    name: &'static str,
    tax_id: &'static str,
    phone: &'static str,
    addresses: &'static [DemoAddress],
}

const CUSTOMERS: &[DemoCustomer] = &[
    DemoCustomer {
        name: "Maria Aparecida Souza",
        tax_id: "529.982.247-25",
        phone: "(41) 99876-1234",
        addresses: &[
            DemoAddress {
                postal_code: "80010-000",
                street: "Rua XV de Novembro",
                number: "1200",
                neighborhood: "Centro",
                principal: false,
            },
            DemoAddress {
                postal_code: "80240-210",
                street: "Avenida Sete de Setembro",
                number: "4500",
                neighborhood: "Batel",
                principal: true,
            },
        ],
    },
    DemoCustomer {
        name: "João Pedro Lima",
        tax_id: "390.533.447-05",
        phone: "(41) 3322-4455",
        addresses: &[DemoAddress {
            postal_code: "80530-000",
            street: "Rua Mateus Leme",
            number: "87",
            neighborhood: "São Francisco",
            principal: false,
        }],
    },
    DemoCustomer {
        name: "Ana Clara Ribeiro",
        tax_id: "153.509.460-56",
        phone: "(41) 98765-4321",
        addresses: &[],
    },
];

const DELIVERERS: &[&str] = &["Carlos Henrique", "Roberta Nunes"];

/// Seed demo data.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection fails or
/// a demo record is rejected.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let database_url: SecretString = super::database_url()?;

    info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    let Some(first) = CUSTOMERS.first() else {
        return Ok(());
    };
    if CustomerRepository::new(&pool)
        .tax_id_taken(&TaxId::parse(first.tax_id)?, None)
        .await?
    {
        info!("Demo data already present, nothing to seed");
        return Ok(());
    }

    let customers = CustomerService::new(&pool);
    let addresses = AddressRepository::new(&pool);
    let mut targets = Vec::new();

    for demo in CUSTOMERS {
        let customer = customers
            .create(&CreateCustomerRequest {
                name: demo.name.to_owned(),
                tax_id: demo.tax_id.to_owned(),
                phone: demo.phone.to_owned(),
            })
            .await?;

        for demo_address in demo.addresses {
            let (fields, principal) = address_request(demo_address).validate()?;
            let address = addresses
                .save(&AddressWrite::insert(customer.id, fields, principal))
                .await?;
            targets.push((customer.id, address.id));
        }
        info!(customer_id = %customer.id, name = demo.name, "Seeded customer");
    }

    let deliverers = DelivererRepository::new(&pool);
    let mut deliverer_ids = Vec::new();
    for name in DELIVERERS {
        deliverer_ids.push(deliverers.create(name).await?.id);
    }

    let deliveries = DeliveryService::new(&pool);
    let now = Utc::now();
    let today = now.date_naive();
    let statuses = DeliveryStatus::ALL;

    for (i, (customer_id, address_id)) in targets.into_iter().enumerate() {
        let offset = u32::try_from(i).unwrap_or(0);
        let request = CreateDeliveryRequest {
            customer: customer_id,
            address: address_id,
            deliverer: deliverer_ids.get(i % deliverer_ids.len().max(1)).copied(),
            status: statuses.get(i % statuses.len()).copied().unwrap_or_default(),
            box_count: i32::try_from(i + 1).unwrap_or(1),
            volumes: ExtraVolumes {
                beverages: i % 2 == 0,
                frozen: i % 3 == 0,
                ..ExtraVolumes::default()
            },
            packer_name: "Demo Packer".to_owned(),
            invoice_number: format!("{}", 1000 + i),
            invoice_series: "1".to_owned(),
            purchase_date: days_ago(today, offset + 1),
            scheduled_at: now + TimeDelta::hours(i64::from(offset) * 2),
        };
        let delivery = deliveries.create(&request).await?;
        info!(delivery_id = %delivery.delivery.id, "Seeded delivery");
    }

    info!("Seed complete");
    pool.close().await;
    Ok(())
}

fn address_request(demo: &DemoAddress) -> CreateAddressRequest {
    CreateAddressRequest {
        postal_code: demo.postal_code.to_owned(),
        street: demo.street.to_owned(),
        number: demo.number.to_owned(),
        complement: None,
        neighborhood: demo.neighborhood.to_owned(),
        city: "Curitiba".to_owned(),
        state: "PR".to_owned(),
        principal: demo.principal,
    }
}

fn days_ago(today: NaiveDate, days: u32) -> NaiveDate {
    today
        .checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(today)
}
