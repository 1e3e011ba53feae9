use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use savora_api::db::create_pool;
use savora_api::config::AppConfig;
use uuid::Uuid;

struct SeedRestaurant {
    name: &'static str,
    description: &'static str,
    cuisine: &'static str,
    rating: f64,
    delivery_time: &'static str,
}

// name, description, price cents, category, is_veg, is_spicy
type SeedMenuItem = (&'static str, &'static str, i64, &'static str, bool, bool);

const RESTAURANTS: &[SeedRestaurant] = &[
    SeedRestaurant {
        name: "Spice Garden",
        description: "Classic North Indian curries and tandoor specials",
        cuisine: "Indian, North Indian",
        rating: 4.7,
        delivery_time: "25-30 min",
    },
    SeedRestaurant {
        name: "South Spice",
        description: "Dosas, idlis and filter coffee",
        cuisine: "Indian, South Indian",
        rating: 4.5,
        delivery_time: "30-35 min",
    },
    SeedRestaurant {
        name: "Delhi Delights",
        description: "Street food favourites from the capital",
        cuisine: "Indian, Street Food",
        rating: 4.3,
        delivery_time: "20-30 min",
    },
    SeedRestaurant {
        name: "Punjab Grill",
        description: "Rich gravies and grilled platters",
        cuisine: "Indian, Punjabi",
        rating: 4.8,
        delivery_time: "35-45 min",
    },
    SeedRestaurant {
        name: "Pizza Paradise",
        description: "Wood-fired pizzas and pastas",
        cuisine: "Italian, Pizza",
        rating: 4.2,
        delivery_time: "30-35 min",
    },
    SeedRestaurant {
        name: "Green Leaf Vegan",
        description: "Plant-based bowls and burgers",
        cuisine: "Vegan, Healthy",
        rating: 4.8,
        delivery_time: "20-30 min",
    },
];

const DEMO_MENU: &[SeedMenuItem] = &[
    (
        "Classic Cheeseburger",
        "Juicy beef patty with melted cheese, lettuce and tomato",
        999,
        "burgers",
        false,
        false,
    ),
    (
        "BBQ Bacon Burger",
        "Smoky BBQ sauce, crispy bacon and onion rings",
        1299,
        "burgers",
        false,
        true,
    ),
    (
        "Veggie Supreme Burger",
        "Plant-based patty with fresh avocado, crisp lettuce, tomato, and vegan mayo",
        1099,
        "burgers",
        true,
        false,
    ),
    (
        "Garden Salad",
        "Mixed greens with house dressing",
        399,
        "sides",
        true,
        false,
    ),
    (
        "Cheesy Bacon Fries",
        "Fries loaded with cheese sauce and bacon bits",
        599,
        "sides",
        false,
        false,
    ),
    (
        "Chocolate Milkshake",
        "Thick shake topped with whipped cream",
        499,
        "beverages",
        true,
        false,
    ),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let customer_id = ensure_user(&pool, "customer@example.com", "customer123", "customer").await?;

    for (index, restaurant) in RESTAURANTS.iter().enumerate() {
        let email = format!("seller{}@example.com", index + 1);
        let owner_id = ensure_user(&pool, &email, "seller123", "seller").await?;
        let restaurant_id = ensure_restaurant(&pool, owner_id, restaurant).await?;
        // Every restaurant gets the demo menu so any seller login has
        // something to manage.
        seed_menu(&pool, restaurant_id).await?;
    }

    println!("Seed completed. Demo customer ID: {customer_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn ensure_restaurant(
    pool: &sqlx::PgPool,
    owner_id: Uuid,
    restaurant: &SeedRestaurant,
) -> anyhow::Result<Uuid> {
    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO restaurants (id, owner_id, name, description, cuisine, rating, delivery_time)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (name) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(owner_id)
    .bind(restaurant.name)
    .bind(restaurant.description)
    .bind(restaurant.cuisine)
    .bind(restaurant.rating)
    .bind(restaurant.delivery_time)
    .fetch_optional(pool)
    .await?;

    let restaurant_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM restaurants WHERE name = $1")
                .bind(restaurant.name)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured restaurant {}", restaurant.name);
    Ok(restaurant_id)
}

async fn seed_menu(pool: &sqlx::PgPool, restaurant_id: Uuid) -> anyhow::Result<()> {
    for (name, description, price, category, is_veg, is_spicy) in DEMO_MENU {
        sqlx::query(
            r#"
            INSERT INTO menu_items
                (id, restaurant_id, name, description, price, category, is_veg, is_spicy)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (restaurant_id, name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(restaurant_id)
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(category)
        .bind(is_veg)
        .bind(is_spicy)
        .execute(pool)
        .await?;
    }
    Ok(())
}
