//! In-memory storefront data behind the mock API.
//!
//! Every operation works on [`MockData`] under one lock and applies the same
//! validation, pricing, visibility and transition rules as the SQL services.
//! Passwords are kept in plain text; this store only ever holds fixtures.

use std::collections::HashMap;

use models::money::{CartLine, discounted_unit_price, line_total, plan_checkout};
use models::{
    AddCartItemRequest, ArtisanSummary, AuthPayload, Cart, CartItem, Category, CategoryRequest, CheckoutRequest,
    CreateIssueRequest, CreateProductRequest, Issue, IssueQuery, IssueStatus, LoginRequest, Order, OrderItem,
    OrderQuery, OrderStatus, PageQuery, Paged, Product, ProductQuery, ProductSort, RegisterRequest, Role,
    UpdateProductRequest, UpdateProfileRequest, User, UserQuery,
};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use crate::error::ApiError;
use crate::services::auth::{AuthError, validate_registration};
use crate::services::cart::{CartError, add_quantities, check_quantity};
use crate::services::categories::CategoryError;
use crate::services::orders::{OrderError, StockMove, authorize_status_change, can_view, stock_move, validate_checkout};
use crate::services::products::{ProductError, may_modify, validate_fields};
use crate::services::session::generate_token;
use crate::services::users::UserError;

pub const SEED_PASSWORD: &str = "password123";
pub const SEED_CLIENT_EMAIL: &str = "test@example.com";
pub const SEED_ARTISAN_EMAIL: &str = "artisan@example.com";
pub const SEED_ADMIN_EMAIL: &str = "admin@example.com";

fn now_rfc3339() -> Option<String> {
    OffsetDateTime::now_utc().format(&Rfc3339).ok()
}

fn paginate<T>(items: Vec<T>, page_query: PageQuery) -> Paged<T> {
    let (page, per_page) = page_query.normalize();
    let total = i64::try_from(items.len()).unwrap_or(i64::MAX);
    let offset = usize::try_from(page_query.offset()).unwrap_or(usize::MAX);
    let items = items.into_iter().skip(offset).take(per_page as usize).collect();
    Paged { items, total, page, per_page }
}

struct MockUser {
    user: User,
    password: String,
}

#[derive(Clone, Copy)]
struct MockCartLine {
    product_id: Uuid,
    quantity: i32,
}

#[derive(Default)]
pub struct MockData {
    users: Vec<MockUser>,
    sessions: HashMap<String, Uuid>,
    categories: Vec<Category>,
    /// Insertion order; the newest product is last.
    products: Vec<Product>,
    carts: HashMap<Uuid, Vec<MockCartLine>>,
    orders: Vec<Order>,
    issues: Vec<Issue>,
}

impl MockData {
    /// Fixture set: one account per role, two categories, three products.
    #[must_use]
    pub fn seeded() -> Self {
        let mut data = Self::default();
        data.insert_user("Test Client", SEED_CLIENT_EMAIL, Role::Client);
        let artisan_id = data.insert_user("Ana Artisan", SEED_ARTISAN_EMAIL, Role::Artisan);
        data.insert_user("Site Admin", SEED_ADMIN_EMAIL, Role::Admin);

        let pottery = data.insert_category("Pottery", "Hand-thrown ceramics");
        let textiles = data.insert_category("Textiles", "Woven and knitted goods");

        data.insert_product(artisan_id, Some(pottery), "Stoneware Mug", 1800, 0, 25);
        data.insert_product(artisan_id, Some(pottery), "Serving Bowl", 4500, 20, 8);
        data.insert_product(artisan_id, Some(textiles), "Wool Scarf", 3200, 10, 12);
        data
    }

    fn insert_user(&mut self, name: &str, email: &str, role: Role) -> Uuid {
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            email: email.to_owned(),
            role,
            phone: None,
            address: None,
            created_at: now_rfc3339(),
        };
        let id = user.id;
        self.users.push(MockUser { user, password: SEED_PASSWORD.to_owned() });
        id
    }

    fn insert_category(&mut self, name: &str, description: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.categories.push(Category { id, name: name.to_owned(), description: Some(description.to_owned()) });
        id
    }

    fn insert_product(
        &mut self,
        artisan_id: Uuid,
        category_id: Option<Uuid>,
        name: &str,
        price_cents: i64,
        discount_percent: i32,
        stock: i32,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let mut product = Product {
            id,
            artisan_id,
            artisan_name: None,
            category_id,
            category_name: None,
            name: name.to_owned(),
            description: None,
            price_cents,
            discount_percent,
            discounted_price_cents: discounted_unit_price(price_cents, discount_percent),
            stock,
            image_url: None,
            is_active: true,
            created_at: now_rfc3339(),
        };
        self.decorate(&mut product);
        self.products.push(product);
        id
    }

    /// Refresh joined names and the discounted price.
    fn decorate(&self, product: &mut Product) {
        product.artisan_name = self.user(product.artisan_id).map(|u| u.name.clone());
        product.category_name = product
            .category_id
            .and_then(|id| self.categories.iter().find(|c| c.id == id))
            .map(|c| c.name.clone());
        product.discounted_price_cents = discounted_unit_price(product.price_cents, product.discount_percent);
    }

    fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.user.id == id).map(|u| &u.user)
    }

    fn product(&self, id: Uuid) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    fn open_session(&mut self, user: User) -> AuthPayload {
        let token = generate_token();
        self.sessions.insert(token.clone(), user.id);
        AuthPayload { token, user }
    }

    // =========================================================================
    // AUTH
    // =========================================================================

    pub fn register(&mut self, req: &RegisterRequest) -> Result<AuthPayload, ApiError> {
        let account = validate_registration(req)?;
        if self.users.iter().any(|u| u.user.email == account.email) {
            return Err(AuthError::EmailTaken.into());
        }
        let id = self.insert_user(&account.name, &account.email, account.role);
        if let Some(record) = self.users.iter_mut().find(|u| u.user.id == id) {
            record.password.clone_from(&req.password);
        }
        let user = self.user(id).cloned().ok_or_else(|| ApiError::not_found("User"))?;
        Ok(self.open_session(user))
    }

    pub fn login(&mut self, req: &LoginRequest) -> Result<AuthPayload, ApiError> {
        let email = crate::services::auth::normalize_email(&req.email);
        let user = self
            .users
            .iter()
            .find(|u| u.user.email == email && u.password == req.password)
            .map(|u| u.user.clone())
            .ok_or(AuthError::InvalidCredentials)?;
        Ok(self.open_session(user))
    }

    #[must_use]
    pub fn session_user(&self, token: &str) -> Option<User> {
        self.sessions.get(token).and_then(|id| self.user(*id)).cloned()
    }

    pub fn logout(&mut self, token: &str) {
        self.sessions.remove(token);
    }

    /// Revoke every session. Returns how many were dropped.
    pub fn expire_sessions(&mut self) -> usize {
        let count = self.sessions.len();
        self.sessions.clear();
        count
    }

    pub fn change_password(&mut self, user_id: Uuid, token: &str, current: &str, new: &str) -> Result<(), ApiError> {
        if new.chars().count() < crate::services::auth::MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword.into());
        }
        let record = self
            .users
            .iter_mut()
            .find(|u| u.user.id == user_id)
            .ok_or(UserError::NotFound(user_id))?;
        if record.password != current {
            return Err(AuthError::WrongPassword.into());
        }
        new.clone_into(&mut record.password);
        self.sessions.retain(|t, id| *id != user_id || t == token);
        Ok(())
    }

    // =========================================================================
    // USERS
    // =========================================================================

    #[must_use]
    pub fn list_users(&self, query: &UserQuery) -> Paged<User> {
        let search = query.search.as_deref().map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty());
        let users: Vec<User> = self
            .users
            .iter()
            .rev()
            .map(|u| &u.user)
            .filter(|u| query.role.is_none_or(|role| u.role == role))
            .filter(|u| {
                search
                    .as_deref()
                    .is_none_or(|s| u.name.to_lowercase().contains(s) || u.email.contains(s))
            })
            .cloned()
            .collect();
        paginate(users, query.page_query())
    }

    pub fn get_user(&self, id: Uuid) -> Result<User, ApiError> {
        self.user(id).cloned().ok_or_else(|| UserError::NotFound(id).into())
    }

    pub fn update_profile(&mut self, id: Uuid, req: &UpdateProfileRequest) -> Result<User, ApiError> {
        let name = req.name.as_deref().map(str::trim);
        if name.is_some_and(str::is_empty) {
            return Err(UserError::EmptyName.into());
        }
        let record = self.users.iter_mut().find(|u| u.user.id == id).ok_or(UserError::NotFound(id))?;
        if let Some(name) = name {
            record.user.name = name.to_owned();
        }
        if let Some(phone) = req.phone.as_deref().map(str::trim) {
            record.user.phone = Some(phone.to_owned()).filter(|p| !p.is_empty());
        }
        if let Some(address) = req.address.as_deref().map(str::trim) {
            record.user.address = Some(address.to_owned()).filter(|a| !a.is_empty());
        }
        Ok(record.user.clone())
    }

    pub fn update_role(&mut self, actor_id: Uuid, id: Uuid, role: Role) -> Result<User, ApiError> {
        if actor_id == id {
            return Err(UserError::SelfDemotion.into());
        }
        let record = self.users.iter_mut().find(|u| u.user.id == id).ok_or(UserError::NotFound(id))?;
        record.user.role = role;
        Ok(record.user.clone())
    }

    pub fn delete_user(&mut self, actor_id: Uuid, id: Uuid) -> Result<(), ApiError> {
        if actor_id == id {
            return Err(UserError::SelfDeletion.into());
        }
        if self.user(id).is_none() {
            return Err(UserError::NotFound(id).into());
        }
        if self.orders.iter().any(|o| o.user_id == id) {
            return Err(UserError::HasOrders.into());
        }
        self.users.retain(|u| u.user.id != id);
        self.sessions.retain(|_, uid| *uid != id);
        self.carts.remove(&id);
        Ok(())
    }

    #[must_use]
    pub fn list_artisans(&self) -> Vec<ArtisanSummary> {
        let mut artisans: Vec<ArtisanSummary> = self
            .users
            .iter()
            .filter(|u| u.user.role == Role::Artisan)
            .map(|u| ArtisanSummary { id: u.user.id, name: u.user.name.clone() })
            .collect();
        artisans.sort_by(|a, b| a.name.cmp(&b.name));
        artisans
    }

    // =========================================================================
    // CATEGORIES
    // =========================================================================

    #[must_use]
    pub fn list_categories(&self) -> Vec<Category> {
        let mut categories = self.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        categories
    }

    pub fn get_category(&self, id: Uuid) -> Result<Category, ApiError> {
        self.categories
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| CategoryError::NotFound(id).into())
    }

    fn clean_category(&self, req: &CategoryRequest, except: Option<Uuid>) -> Result<(String, Option<String>), ApiError> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(CategoryError::NameRequired.into());
        }
        if self.categories.iter().any(|c| c.name == name && Some(c.id) != except) {
            return Err(CategoryError::Duplicate.into());
        }
        let description = req.description.as_deref().map(str::trim).filter(|d| !d.is_empty()).map(str::to_owned);
        Ok((name.to_owned(), description))
    }

    pub fn create_category(&mut self, req: &CategoryRequest) -> Result<Category, ApiError> {
        let (name, description) = self.clean_category(req, None)?;
        let category = Category { id: Uuid::new_v4(), name, description };
        self.categories.push(category.clone());
        Ok(category)
    }

    pub fn update_category(&mut self, id: Uuid, req: &CategoryRequest) -> Result<Category, ApiError> {
        let (name, description) = self.clean_category(req, Some(id))?;
        let category = self.categories.iter_mut().find(|c| c.id == id).ok_or(CategoryError::NotFound(id))?;
        category.name = name;
        category.description = description;
        let updated = category.clone();
        self.refresh_products();
        Ok(updated)
    }

    pub fn delete_category(&mut self, id: Uuid) -> Result<(), ApiError> {
        let before = self.categories.len();
        self.categories.retain(|c| c.id != id);
        if self.categories.len() == before {
            return Err(CategoryError::NotFound(id).into());
        }
        for product in &mut self.products {
            if product.category_id == Some(id) {
                product.category_id = None;
            }
        }
        self.refresh_products();
        Ok(())
    }

    fn refresh_products(&mut self) {
        let mut products = std::mem::take(&mut self.products);
        for product in &mut products {
            self.decorate(product);
        }
        self.products = products;
    }

    // =========================================================================
    // PRODUCTS
    // =========================================================================

    #[must_use]
    pub fn list_products(&self, query: &ProductQuery, viewer: Option<&User>) -> Paged<Product> {
        let include_inactive = query.include_inactive.unwrap_or(false);
        let search = query.search.as_deref().map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty());
        let mut products: Vec<Product> = self
            .products
            .iter()
            .rev()
            .filter(|p| {
                p.is_active
                    || (include_inactive
                        && viewer.is_some_and(|v| v.role == Role::Admin || (v.role == Role::Artisan && v.id == p.artisan_id)))
            })
            .filter(|p| query.category_id.is_none_or(|id| p.category_id == Some(id)))
            .filter(|p| query.artisan_id.is_none_or(|id| p.artisan_id == id))
            .filter(|p| query.min_price.is_none_or(|min| p.price_cents >= min))
            .filter(|p| query.max_price.is_none_or(|max| p.price_cents <= max))
            .filter(|p| {
                search.as_deref().is_none_or(|s| {
                    p.name.to_lowercase().contains(s)
                        || p.description.as_deref().is_some_and(|d| d.to_lowercase().contains(s))
                })
            })
            .cloned()
            .collect();
        match query.sort.unwrap_or_default() {
            ProductSort::Newest => {}
            ProductSort::PriceAsc => products.sort_by_key(|p| p.price_cents),
            ProductSort::PriceDesc => products.sort_by_key(|p| std::cmp::Reverse(p.price_cents)),
            ProductSort::Name => products.sort_by_key(|p| p.name.to_lowercase()),
        }
        paginate(products, query.page_query())
    }

    pub fn get_product(&self, id: Uuid, viewer: Option<&User>) -> Result<Product, ApiError> {
        self.product(id)
            .filter(|p| p.is_active || viewer.is_some_and(|v| may_modify(v, p.artisan_id)))
            .cloned()
            .ok_or_else(|| ProductError::NotFound(id).into())
    }

    fn check_category(&self, category_id: Option<Uuid>) -> Result<(), ApiError> {
        match category_id {
            Some(id) if !self.categories.iter().any(|c| c.id == id) => Err(ProductError::UnknownCategory.into()),
            _ => Ok(()),
        }
    }

    pub fn create_product(&mut self, actor: &User, req: &CreateProductRequest) -> Result<Product, ApiError> {
        if !matches!(actor.role, Role::Artisan | Role::Admin) {
            return Err(ProductError::RoleNotAllowed.into());
        }
        validate_fields(Some(&req.name), Some(req.price_cents), Some(req.discount_percent), Some(req.stock))?;
        self.check_category(req.category_id)?;
        let id = self.insert_product(
            actor.id,
            req.category_id,
            req.name.trim(),
            req.price_cents,
            req.discount_percent,
            req.stock,
        );
        let product = self.products.iter_mut().find(|p| p.id == id).ok_or(ProductError::NotFound(id))?;
        product.description.clone_from(&req.description);
        product.image_url.clone_from(&req.image_url);
        Ok(product.clone())
    }

    pub fn update_product(&mut self, actor: &User, id: Uuid, req: &UpdateProductRequest) -> Result<Product, ApiError> {
        validate_fields(req.name.as_deref(), req.price_cents, req.discount_percent, req.stock)?;
        self.check_category(req.category_id)?;
        let owner = self.product(id).ok_or(ProductError::NotFound(id))?.artisan_id;
        if !may_modify(actor, owner) {
            return Err(ProductError::NotOwner.into());
        }
        let mut product = self.product(id).cloned().ok_or(ProductError::NotFound(id))?;
        if let Some(name) = &req.name {
            name.trim().clone_into(&mut product.name);
        }
        if req.description.is_some() {
            product.description.clone_from(&req.description);
        }
        if let Some(price) = req.price_cents {
            product.price_cents = price;
        }
        if let Some(discount) = req.discount_percent {
            product.discount_percent = discount;
        }
        if let Some(stock) = req.stock {
            product.stock = stock;
        }
        if req.category_id.is_some() {
            product.category_id = req.category_id;
        }
        if req.image_url.is_some() {
            product.image_url.clone_from(&req.image_url);
        }
        if let Some(active) = req.is_active {
            product.is_active = active;
        }
        self.decorate(&mut product);
        if let Some(slot) = self.products.iter_mut().find(|p| p.id == id) {
            *slot = product.clone();
        }
        Ok(product)
    }

    pub fn delete_product(&mut self, actor: &User, id: Uuid) -> Result<(), ApiError> {
        let owner = self.product(id).ok_or(ProductError::NotFound(id))?.artisan_id;
        if !may_modify(actor, owner) {
            return Err(ProductError::NotOwner.into());
        }
        if let Some(product) = self.products.iter_mut().find(|p| p.id == id) {
            product.is_active = false;
        }
        for lines in self.carts.values_mut() {
            lines.retain(|l| l.product_id != id);
        }
        Ok(())
    }

    // =========================================================================
    // CART
    // =========================================================================

    #[must_use]
    pub fn cart(&self, user_id: Uuid) -> Cart {
        let items = self
            .carts
            .get(&user_id)
            .into_iter()
            .flatten()
            .filter_map(|line| {
                let product = self.product(line.product_id)?;
                Some(CartItem {
                    product_id: product.id,
                    name: product.name.clone(),
                    quantity: line.quantity,
                    price_cents: product.price_cents,
                    discount_percent: product.discount_percent,
                    discounted_price_cents: product.discounted_price_cents,
                    line_total_cents: line_total(product.discounted_price_cents, line.quantity),
                    stock: product.stock,
                    image_url: product.image_url.clone(),
                })
            })
            .collect();
        Cart::from_items(items)
    }

    pub fn add_to_cart(&mut self, user_id: Uuid, req: &AddCartItemRequest) -> Result<Cart, ApiError> {
        check_quantity(req.quantity)?;
        if !self.product(req.product_id).is_some_and(|p| p.is_active) {
            return Err(CartError::ProductNotFound(req.product_id).into());
        }
        let lines = self.carts.entry(user_id).or_default();
        match lines.iter_mut().find(|l| l.product_id == req.product_id) {
            Some(line) => line.quantity = add_quantities(line.quantity, req.quantity)?,
            None => lines.push(MockCartLine { product_id: req.product_id, quantity: req.quantity }),
        }
        Ok(self.cart(user_id))
    }

    pub fn set_cart_quantity(&mut self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<Cart, ApiError> {
        if quantity < 0 {
            return Err(CartError::NegativeQuantity.into());
        }
        if quantity == 0 {
            return self.remove_from_cart(user_id, product_id);
        }
        check_quantity(quantity)?;
        let line = self
            .carts
            .get_mut(&user_id)
            .and_then(|lines| lines.iter_mut().find(|l| l.product_id == product_id))
            .ok_or(CartError::ItemNotFound(product_id))?;
        line.quantity = quantity;
        Ok(self.cart(user_id))
    }

    pub fn remove_from_cart(&mut self, user_id: Uuid, product_id: Uuid) -> Result<Cart, ApiError> {
        let lines = self.carts.entry(user_id).or_default();
        let before = lines.len();
        lines.retain(|l| l.product_id != product_id);
        if lines.len() == before {
            return Err(CartError::ItemNotFound(product_id).into());
        }
        Ok(self.cart(user_id))
    }

    pub fn clear_cart(&mut self, user_id: Uuid) {
        self.carts.remove(&user_id);
    }

    // =========================================================================
    // ORDERS
    // =========================================================================

    pub fn checkout(&mut self, customer: &User, req: &CheckoutRequest) -> Result<Order, ApiError> {
        validate_checkout(req)?;
        let lines = self.carts.get(&customer.id).cloned().unwrap_or_default();
        if lines.is_empty() {
            return Err(OrderError::EmptyCart.into());
        }

        let mut cart_lines = Vec::with_capacity(lines.len());
        for line in &lines {
            let product = self.product(line.product_id).ok_or(OrderError::ProductUnavailable(line.product_id))?;
            if !product.is_active {
                return Err(OrderError::ProductUnavailable(product.id).into());
            }
            if product.stock < line.quantity {
                return Err(OrderError::InsufficientStock(product.id).into());
            }
            cart_lines.push(CartLine {
                product_id: product.id,
                artisan_id: product.artisan_id,
                quantity: line.quantity,
                price_cents: product.price_cents,
                discount_percent: product.discount_percent,
            });
        }
        let plan = plan_checkout(&cart_lines);

        let items = plan
            .lines
            .iter()
            .map(|line| OrderItem {
                id: Uuid::new_v4(),
                product_id: line.product_id,
                product_name: self.product(line.product_id).map(|p| p.name.clone()),
                artisan_id: line.artisan_id,
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                line_total_cents: line.line_total_cents,
            })
            .collect();
        for line in &plan.lines {
            if let Some(product) = self.products.iter_mut().find(|p| p.id == line.product_id) {
                product.stock -= line.quantity;
            }
        }
        self.carts.remove(&customer.id);

        let now = now_rfc3339();
        let order = Order {
            id: Uuid::new_v4(),
            user_id: customer.id,
            customer_name: Some(customer.name.clone()),
            status: OrderStatus::Pending,
            total_cents: plan.total_cents,
            shipping_address: req.shipping_address.trim().to_owned(),
            payment_method: req.payment_method,
            payment_intent_id: req
                .payment_intent_id
                .clone()
                .filter(|_| req.payment_method.requires_intent()),
            items,
            created_at: now.clone(),
            updated_at: now,
        };
        self.orders.push(order.clone());
        Ok(order)
    }

    #[must_use]
    pub fn list_orders(&self, viewer: &User, query: &OrderQuery) -> Paged<Order> {
        let orders: Vec<Order> = self
            .orders
            .iter()
            .rev()
            .filter(|o| can_view(viewer, o))
            .filter(|o| query.status.is_none_or(|s| o.status == s))
            .cloned()
            .collect();
        paginate(orders, query.page_query())
    }

    pub fn get_order(&self, viewer: &User, id: Uuid) -> Result<Order, ApiError> {
        self.orders
            .iter()
            .find(|o| o.id == id && can_view(viewer, o))
            .cloned()
            .ok_or_else(|| OrderError::NotFound(id).into())
    }

    pub fn update_order_status(&mut self, actor: &User, id: Uuid, next: OrderStatus) -> Result<Order, ApiError> {
        let order = self.get_order(actor, id)?;
        authorize_status_change(actor, &order, next)?;
        match stock_move(order.status, next) {
            Some(StockMove::Restock) => {
                for item in &order.items {
                    if let Some(product) = self.products.iter_mut().find(|p| p.id == item.product_id) {
                        product.stock += item.quantity;
                    }
                }
            }
            Some(StockMove::Reserve) => {
                // Check every line before touching any product.
                for item in &order.items {
                    if self.product(item.product_id).is_none_or(|p| p.stock < item.quantity) {
                        return Err(OrderError::InsufficientStock(item.product_id).into());
                    }
                }
                for item in &order.items {
                    if let Some(product) = self.products.iter_mut().find(|p| p.id == item.product_id) {
                        product.stock -= item.quantity;
                    }
                }
            }
            None => {}
        }
        let stored = self.orders.iter_mut().find(|o| o.id == id).ok_or(OrderError::NotFound(id))?;
        stored.status = next;
        stored.updated_at = now_rfc3339();
        Ok(stored.clone())
    }

    // =========================================================================
    // ISSUES
    // =========================================================================

    pub fn create_issue(&mut self, reporter: &User, req: &CreateIssueRequest) -> Result<Issue, ApiError> {
        use crate::services::issues::IssueError;

        let subject = req.subject.trim();
        let description = req.description.trim();
        if subject.is_empty() || description.is_empty() {
            return Err(IssueError::MissingFields.into());
        }
        if let Some(order_id) = req.order_id {
            if !self.orders.iter().any(|o| o.id == order_id && o.user_id == reporter.id) {
                return Err(IssueError::UnknownOrder(order_id).into());
            }
        }
        let issue = Issue {
            id: Uuid::new_v4(),
            user_id: reporter.id,
            order_id: req.order_id,
            subject: subject.to_owned(),
            description: description.to_owned(),
            status: IssueStatus::Open,
            created_at: now_rfc3339(),
        };
        self.issues.push(issue.clone());
        Ok(issue)
    }

    #[must_use]
    pub fn list_issues(&self, viewer: &User, query: &IssueQuery) -> Paged<Issue> {
        let issues: Vec<Issue> = self
            .issues
            .iter()
            .rev()
            .filter(|i| viewer.role == Role::Admin || i.user_id == viewer.id)
            .filter(|i| query.status.is_none_or(|s| i.status == s))
            .cloned()
            .collect();
        paginate(issues, query.page_query())
    }

    pub fn update_issue_status(&mut self, id: Uuid, status: IssueStatus) -> Result<Issue, ApiError> {
        let issue = self
            .issues
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(crate::services::issues::IssueError::NotFound(id))?;
        issue.status = status;
        Ok(issue.clone())
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
